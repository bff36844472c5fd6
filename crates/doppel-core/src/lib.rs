//! Shared vocabulary for the doppel workspace: identifiers, chat messages,
//! transcript turns, the completion-service contract and the events a
//! front-end renders.

pub mod errors;
pub mod events;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod turn;

pub use errors::{ErrorCategory, ServiceError};
pub use events::{ChatEvent, NoticeLevel};
pub use ids::{DispatchId, SessionId};
pub use messages::{ChatMessage, Role};
pub use provider::{CompletionOptions, CompletionProvider, CompletionRequest};
pub use turn::Turn;
