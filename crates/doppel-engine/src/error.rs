use doppel_core::{DispatchId, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("completion failed: {0}")]
    Service(#[from] ServiceError),

    #[error("orchestrator shut down")]
    Shutdown,
}

/// Result of one delivered reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub dispatch_id: DispatchId,
    pub combined: String,
    pub segments: usize,
}
