//! Command handlers for the Pulse CLI.

pub mod ask;
pub mod chat;
pub mod route;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use route::RouteCommand;
pub use stats::StatsCommand;
