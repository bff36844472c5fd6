use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Context text as the chat prompt consumes it.
#[derive(Clone, Debug)]
pub struct LoadedContext {
    pub text: String,
    /// File the text came from, if any.
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedContext {
    pub fn new(text: impl Into<String>, source: Option<PathBuf>) -> Self {
        Self {
            text: text.into(),
            source,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new(), None)
    }

    /// Memory size reported to the user, in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Shared, atomically replaceable reference to the active context.
///
/// Readers take an `Arc` snapshot and keep using it even if a swap happens
/// meanwhile, so they see either the old context or the new one in full.
#[derive(Clone, Debug)]
pub struct ContextHandle {
    current: Arc<RwLock<Arc<LoadedContext>>>,
}

impl ContextHandle {
    pub fn new(context: LoadedContext) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(context))),
        }
    }

    pub fn snapshot(&self) -> Arc<LoadedContext> {
        Arc::clone(&self.current.read())
    }

    /// Install `context`, returning the one it replaced.
    pub fn replace(&self, context: LoadedContext) -> Arc<LoadedContext> {
        std::mem::replace(&mut *self.current.write(), Arc::new(context))
    }
}

impl Default for ContextHandle {
    fn default() -> Self {
        Self::new(LoadedContext::empty())
    }
}
