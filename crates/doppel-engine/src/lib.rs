//! The live conversation loop.
//!
//! [`TurnOrchestrator`] owns the pending input buffer and the short-term
//! history for one session. Front-ends feed it user lines and render the
//! [`doppel_core::ChatEvent`]s it broadcasts.

pub mod debounce;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod reply;

pub use debounce::Debouncer;
pub use error::{DispatchOutcome, EngineError};
pub use history::{ShortTermHistory, DEFAULT_HISTORY_CAP};
pub use orchestrator::{OrchestratorConfig, ThinkingDelay, TurnOrchestrator, TurnState};
pub use prompt::{Persona, PromptBuilder};
pub use reply::{PacedSegment, PacingPolicy, ReplyPlan, REPLY_DELIMITER};
