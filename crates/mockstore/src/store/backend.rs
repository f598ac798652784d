use crate::error::Result;
use crate::resource::Resource;
use async_trait::async_trait;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while [`ResourceStore`](super::resource_store::ResourceStore) handles the "what"
/// (identity matching, merging, filtering).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Load every record relevant to `collection`.
    ///
    /// Backends may return more than the collection (the memory backend returns
    /// everything); the store filters. A collection that was never written is an
    /// empty list, not an error.
    async fn open(&self, collection: &str) -> Result<Vec<Resource>>;

    /// Replace the stored record set for `collection` with `resources`.
    /// MUST be all-or-nothing: on error the previous state is left intact.
    async fn commit(&self, collection: &str, resources: &[Resource]) -> Result<()>;
}
