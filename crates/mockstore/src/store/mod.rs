//! # Storage Layer
//!
//! This module defines the storage abstraction for mocked resources. The
//! [`DataStore`] trait is what the mock-serving layer talks to; it is handed a
//! store at construction time rather than discovering one.
//!
//! ## Engine and Backends
//!
//! The CRUD logic is written once, in [`resource_store::ResourceStore`], against
//! two primitive hooks declared by [`backend::StorageBackend`]:
//!
//! - `open(collection)`: read every record relevant to a collection
//! - `commit(collection, records)`: persist the full updated set, all-or-nothing
//!
//! Every operation is an open → mutate → commit cycle. Identity matching, merging
//! and collection filtering all happen in the engine, never in a backend.
//!
//! ## Implementations
//!
//! - [`mem_backend::MemBackend`]: one process-local list shared by all collections.
//! - [`fs_backend::FsBackend`]: one JSON file per collection under a base directory.
//!
//! ## Storage Layout
//!
//! For `FsBackend`:
//! ```text
//! <base>/
//! ├── .json               # Root collection
//! ├── users.json          # /users
//! └── users/
//!     └── jdoe/
//!         └── orders.json # /users/jdoe/orders
//! ```
//!
//! ## Consistency
//!
//! There is no locking around the open → commit cycle. Two concurrent saves to the
//! same collection can interleave so that the second commit drops the first
//! write. Callers needing stronger guarantees wrap a store in
//! [`serialized::SerializedStore`].

use crate::error::Result;
use crate::identity::ResourceIdentity;
use crate::resource::Resource;
use async_trait::async_trait;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod resource_store;
pub mod serialized;

/// Abstract interface for resource storage.
///
/// Absence is never an error: lookups return `None` or an empty list.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Save a resource, merging into an existing record with the same identity.
    async fn save_resource(&self, resource: Resource) -> Result<Resource>;

    /// Save a batch under `collection` in a single commit. Returns the whole
    /// collection afterwards.
    async fn save_collection(
        &self,
        collection: &str,
        resources: Vec<Resource>,
    ) -> Result<Vec<Resource>>;

    /// Get the resource matching `identity`
    async fn get_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>>;

    /// List every resource in `collection`
    async fn get_collection(&self, collection: &str) -> Result<Vec<Resource>>;

    /// Delete the resource matching `identity`, returning it if it existed
    async fn delete_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>>;

    /// Delete `resources` (by name) from `collection`, or the whole collection
    /// when `resources` is `None`. Returns what was removed.
    async fn delete_collection(
        &self,
        collection: &str,
        resources: Option<&[Resource]>,
    ) -> Result<Vec<Resource>>;
}
