//! Prompt Builder: turns a companion snapshot and a new user message into a
//! single stage-constrained prompt plus generation parameters. Pure and
//! infallible; it performs no I/O.

pub mod builder;
pub mod personality;
pub mod stage;
pub mod state;

pub use builder::{PromptBuilder, PromptPlan, DEFAULT_COMPANION_NAME, STOP_SEQUENCES};
pub use personality::{Personality, PersonalityTrait};
pub use stage::{Stage, StageProfile, STAGE_TABLE};
pub use state::{ChatRole, ChatTurn, CompanionState, Concept, VocabularyWord};
