use serde::{Deserialize, Serialize};

use crate::ids::{DispatchId, SessionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Events emitted by the orchestrator for whichever front-end is attached.
/// Front-ends only render; they never mutate conversation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// A user message was accepted into the pending buffer.
    #[serde(rename = "user_message")]
    UserMessage { session_id: SessionId, text: String },

    /// The debounce window closed and a combined message went out.
    #[serde(rename = "dispatched")]
    Dispatched {
        session_id: SessionId,
        dispatch_id: DispatchId,
        combined: String,
    },

    /// One bubble of a multi-part reply.
    #[serde(rename = "reply_segment")]
    ReplySegment {
        session_id: SessionId,
        dispatch_id: DispatchId,
        index: usize,
        total: usize,
        text: String,
    },

    /// All segments were delivered and the exchange was recorded in history.
    #[serde(rename = "reply_complete")]
    ReplyComplete {
        session_id: SessionId,
        dispatch_id: DispatchId,
        segments: usize,
    },

    #[serde(rename = "system_notice")]
    SystemNotice {
        session_id: SessionId,
        level: NoticeLevel,
        text: String,
    },
}
