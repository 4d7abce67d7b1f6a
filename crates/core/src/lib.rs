//! Pulse Core Library
//!
//! This crate provides the foundational pieces shared by every Pulse crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Retrieved context types (`Context`, `ContextSnippet`)

pub mod config;
pub mod context;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ConfigOverrides};
pub use context::{Context, ContextSnippet, SnippetOrigin};
pub use error::{AppError, AppResult};
