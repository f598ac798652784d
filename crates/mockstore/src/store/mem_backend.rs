use super::backend::StorageBackend;
use crate::error::{Result, StoreError};
use crate::resource::Resource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory storage backend.
///
/// Holds a single ordered list shared by every collection; the store does the
/// filtering. Each instance owns its own list.
#[derive(Default)]
pub struct MemBackend {
    resources: RwLock<Vec<Resource>>,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of records currently held, across all collections.
    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemBackend {
    async fn open(&self, collection: &str) -> Result<Vec<Resource>> {
        tokio::task::yield_now().await;
        let resources = self.resources.read().await.clone();
        debug!(collection, count = resources.len(), "opened memory collection");
        Ok(resources)
    }

    async fn commit(&self, collection: &str, resources: &[Resource]) -> Result<()> {
        tokio::task::yield_now().await;
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated write error".to_string()));
        }
        *self.resources.write().await = resources.to_vec();
        debug!(collection, count = resources.len(), "committed memory collection");
        Ok(())
    }
}
