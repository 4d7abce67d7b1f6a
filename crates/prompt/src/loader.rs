//! Prompt loader for YAML prompt definitions.
//!
//! Built-in prompts ship with the binary. A workspace can override any of
//! them by placing `<id>.yml` in `.pulse/prompts/`.

use crate::types::PromptDefinition;
use pulse_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Routing instruction (`vector` / `live`).
pub const ROUTER_PROMPT_ID: &str = "router.classify";

/// Grounded answer over knowledge base snippets.
pub const STATIC_ANSWER_PROMPT_ID: &str = "answer.static";

/// Grounded answer over live news snippets.
pub const LIVE_ANSWER_PROMPT_ID: &str = "answer.live";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        ROUTER_PROMPT_ID,
        include_str!("../prompts/router.classify.yml"),
    ),
    (
        STATIC_ANSWER_PROMPT_ID,
        include_str!("../prompts/answer.static.yml"),
    ),
    (
        LIVE_ANSWER_PROMPT_ID,
        include_str!("../prompts/answer.live.yml"),
    ),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".pulse/prompts")
}

/// Load a prompt definition by ID.
///
/// Looks for `.pulse/prompts/<id>.yml` under `workspace_path` first and falls
/// back to the built-in definition.
///
/// # Example
/// ```no_run
/// use pulse_prompt::{load_prompt, ROUTER_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ROUTER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.is_file() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id)
}

/// Load a built-in prompt definition, ignoring workspace overrides.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(contents, prompt_id)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(refusal) = &def.refusal {
        if refusal.trim().is_empty() {
            return Err(AppError::Prompt(format!(
                "Prompt {} declares an empty refusal sentence",
                def.id
            )));
        }
    }

    Ok(())
}
