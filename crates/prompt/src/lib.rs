//! Prompt system for Pulse.
//!
//! This crate provides structured prompt management with:
//! - Built-in YAML prompt definitions for routing and answering
//! - Per-workspace overrides in `.pulse/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, load_prompt, LIVE_ANSWER_PROMPT_ID, ROUTER_PROMPT_ID,
    STATIC_ANSWER_PROMPT_ID,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
