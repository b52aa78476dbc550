//! # planforge-runtime
//!
//! Runtime integrations for planforge: the hosted chat-completions client
//! implementing `planforge_core::LlmProvider`, and the plan-generation
//! service that turns a validated form into a stored business-plan
//! document, falling back to a deterministic template whenever the
//! endpoint misbehaves.

mod completion;
mod generator;

pub use completion::{CompletionConfig, HostedCompletionProvider};
pub use generator::{GeneratedPlan, PlanForm, PlanGenerator};
