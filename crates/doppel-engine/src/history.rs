use std::collections::VecDeque;

use doppel_core::ChatMessage;

/// 10 user/assistant pairs.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Bounded FIFO of the most recent exchanged messages.
#[derive(Clone, Debug)]
pub struct ShortTermHistory {
    entries: VecDeque<ChatMessage>,
    cap: usize,
}

impl Default for ShortTermHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl ShortTermHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap,
        }
    }

    /// Record one exchange, then evict the oldest entries beyond the cap.
    pub fn append_pair(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.entries.push_back(ChatMessage::user(user));
        self.entries.push_back(ChatMessage::assistant(assistant));
        self.trim();
    }

    pub fn trim(&mut self) {
        while self.entries.len() > self.cap {
            let _ = self.entries.pop_front();
        }
    }

    /// Copy for prompt assembly; later appends do not affect it.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
