//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use pulse_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// The definition's refusal sentence is injected as `refusal` unless the
/// caller supplies one. Both the optional system instruction and the main
/// template are rendered with the same variables.
///
/// # Example
/// ```no_run
/// use pulse_prompt::{build_prompt, builtin_prompt, STATIC_ANSWER_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(STATIC_ANSWER_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is a dividend?".to_string());
/// vars.insert("context".to_string(), "A dividend is ...".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    if let Some(refusal) = &definition.refusal {
        variables
            .entry("refusal".to_string())
            .or_insert_with(|| refusal.clone());
    }

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{builtin_prompt, LIVE_ANSWER_PROMPT_ID, ROUTER_PROMPT_ID};

    fn create_test_definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "answer.static".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: "Q: {{question}} else say {{refusal}}".to_string(),
            refusal: Some("Unknown.".to_string()),
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{question}}", &vars(&[("question", "Hi")]));
        assert_eq!(result.unwrap(), "Question: Hi");
    }

    #[test]
    fn test_no_html_escaping() {
        let result = render_template("{{context}}", &vars(&[("context", "P&L <Q3> \"up\"")]));
        assert_eq!(result.unwrap(), "P&L <Q3> \"up\"");
    }

    #[test]
    fn test_refusal_injected() {
        let def = create_test_definition(None);
        let built = build_prompt(&def, vars(&[("question", "Why?")])).unwrap();

        assert_eq!(built.user, "Q: Why? else say Unknown.");
        assert!(built.system.is_none());
        assert_eq!(built.metadata.resolved_variables["refusal"], "Unknown.");
    }

    #[test]
    fn test_caller_refusal_takes_precedence() {
        let def = create_test_definition(None);
        let built = build_prompt(&def, vars(&[("question", "Why?"), ("refusal", "Pass.")])).unwrap();
        assert_eq!(built.user, "Q: Why? else say Pass.");
    }

    #[test]
    fn test_system_rendered() {
        let def = create_test_definition(Some("Persona for {{question}}"));
        let built = build_prompt(&def, vars(&[("question", "X")])).unwrap();
        assert_eq!(built.system.as_deref(), Some("Persona for X"));
    }

    #[test]
    fn test_builtin_router_prompt_renders_question() {
        let def = builtin_prompt(ROUTER_PROMPT_ID).unwrap();
        let built = build_prompt(&def, vars(&[("question", "Price of gold today?")])).unwrap();
        assert!(built.user.contains("Question: Price of gold today?"));
        assert!(built.user.contains("vector or live"));
    }

    #[test]
    fn test_builtin_live_prompt_embeds_context_and_refusal() {
        let def = builtin_prompt(LIVE_ANSWER_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("question", "How is Tesla doing?"),
                ("context", "Title: Tesla rallies\nDescription: Shares up 5%"),
            ]),
        )
        .unwrap();

        assert!(built.user.contains("Title: Tesla rallies"));
        assert!(built
            .user
            .contains("I don't have enough live information to answer that."));
        assert!(built.user.contains("investor assistant"));
    }

    #[test]
    fn test_unclosed_template_fails() {
        let err = render_template("{{#if question}}open", &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }
}
