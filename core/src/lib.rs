//! Core library behind the Pal companion's replies.
//!
//! Each module is intentionally kept lightweight so that the boundaries
//! between responsibilities remain obvious when exploring the codebase:
//! - [`prompt`] derives the developmental stage and assembles the prompt.
//! - [`agents`] holds provider configuration and the model adapter that
//!   talks to local and cloud LLM backends.
//! - [`model_manager`] composes both for callers that want fallbacks.
//! - [`errors`] keeps the error catalogue with human friendly metadata.
//! - [`logging`] emits structured diagnostics through the `log` facade.

pub mod agents;
pub mod errors;
pub mod logging;
pub mod model_manager;
pub mod prompt;

pub use agents::{GenerateOptions, HealthStatus, ModelAdapter, ProviderConfig, ProviderKind};
pub use errors::{PalError, Result};
pub use model_manager::{CompanionReply, ModelManager};
pub use prompt::{CompanionState, PromptBuilder, PromptPlan, Stage};
