//! Pulse question answering.
//!
//! [`Pipeline`] wires the [`Router`], the two retrieval leaves and the
//! [`AnswerSynthesizer`] together. Each question takes exactly one path.

pub mod answer;
pub mod pipeline;
pub mod route;
pub mod router;
pub mod synthesizer;


pub use answer::Answer;
pub use pipeline::{Pipeline, PipelineLimits};
pub use route::RouteDecision;
pub use router::Router;
pub use synthesizer::{AnswerSynthesizer, LIVE_REFUSAL, STATIC_REFUSAL};
