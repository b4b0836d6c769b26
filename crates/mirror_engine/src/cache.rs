use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use mirror_core::RenderedContent;

/// Latest rendered snapshot, shared between the sync driver and readers.
///
/// Readers get an `Arc` to an immutable snapshot, so they never observe a
/// half-replaced value and never hold the lock while rendering.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    current: Arc<RwLock<Arc<RenderedContent>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Arc<RenderedContent> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn rendered_at(&self) -> DateTime<Utc> {
        self.get().rendered_at
    }

    /// Only the sync driver calls this, after a successful cycle.
    pub fn replace(&self, content: RenderedContent) {
        let next = Arc::new(content);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}
