use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::document::OffscreenHandle;

/// Singleton key of the offscreen recorder document
pub const OFFSCREEN_DOCUMENT_ID: &str = "offscreen";

/// Registry of offscreen documents keyed by id
///
/// Lookup and creation happen under one lock, so concurrent `ensure` calls
/// for the same id create at most one document.
#[derive(Default)]
pub struct OffscreenRegistry {
    entries: Mutex<HashMap<String, OffscreenHandle>>,
    created: AtomicUsize,
}

impl OffscreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live document for `id`, creating it if absent
    ///
    /// A registered document whose task has exited is replaced.
    pub async fn ensure<F>(&self, id: &str, create: F) -> OffscreenHandle
    where
        F: FnOnce() -> OffscreenHandle,
    {
        let mut entries = self.entries.lock().await;

        match entries.get(id) {
            Some(handle) if handle.is_alive() => {
                debug!("Reusing offscreen document {}", id);
                return handle.clone();
            }
            Some(_) => warn!("Offscreen document {} exited, recreating", id),
            None => {}
        }

        let handle = create();
        self.created.fetch_add(1, Ordering::SeqCst);
        entries.insert(id.to_string(), handle.clone());
        handle
    }

    pub async fn get(&self, id: &str) -> Option<OffscreenHandle> {
        let entries = self.entries.lock().await;
        entries.get(id).filter(|h| h.is_alive()).cloned()
    }

    /// Drop the registry's reference; the document exits once unused
    pub async fn close(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(id).is_some()
    }

    /// Number of documents created over the registry's lifetime
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}
