//! # Serialized Store
//!
//! Wraps any [`DataStore`] so that operations on the same collection run one at a
//! time, closing the lost-update window of the bare open → commit cycle.
//!
//! Locks are keyed by the collection's non-empty segments, lower-cased, which is
//! the same reduction the file backend applies when it picks a file. Every spelling
//! that reaches one backing file (`/Users/`, `users`, `//users`) shares one lock.
//! Idle locks are dropped from the map the next time a lock is handed out.
//!
//! The memory backend keeps every collection in a single list and commits that
//! whole list, so writes to *different* collections can still clobber each other.
//! Use [`SerializedStore::single_writer`] there.

use super::DataStore;
use crate::error::Result;
use crate::identity::ResourceIdentity;
use crate::resource::Resource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockScope {
    PerCollection,
    Global,
}

pub struct SerializedStore<S: DataStore> {
    inner: S,
    scope: LockScope,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<S: DataStore> SerializedStore<S> {
    /// One lock per collection; different collections proceed independently.
    pub fn new(inner: S) -> Self {
        Self::with_scope(inner, LockScope::PerCollection)
    }

    /// One lock for everything.
    pub fn single_writer(inner: S) -> Self {
        Self::with_scope(inner, LockScope::Global)
    }

    fn with_scope(inner: S, scope: LockScope) -> Self {
        Self {
            inner,
            scope,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lock_for(&self, collection: &str) -> Arc<AsyncMutex<()>> {
        let key = match self.scope {
            LockScope::PerCollection => lock_key(collection),
            LockScope::Global => String::new(),
        };
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned under this mutex, so a count of one means idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key).or_default().clone()
    }
}

fn lock_key(collection: &str) -> String {
    collection
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl<S: DataStore> DataStore for SerializedStore<S> {
    async fn save_resource(&self, resource: Resource) -> Result<Resource> {
        let lock = self.lock_for(resource.collection());
        let _guard = lock.lock().await;
        self.inner.save_resource(resource).await
    }

    async fn save_collection(
        &self,
        collection: &str,
        resources: Vec<Resource>,
    ) -> Result<Vec<Resource>> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.inner.save_collection(collection, resources).await
    }

    async fn get_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>> {
        let lock = self.lock_for(identity.collection());
        let _guard = lock.lock().await;
        self.inner.get_resource(identity).await
    }

    async fn get_collection(&self, collection: &str) -> Result<Vec<Resource>> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.inner.get_collection(collection).await
    }

    async fn delete_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>> {
        let lock = self.lock_for(identity.collection());
        let _guard = lock.lock().await;
        self.inner.delete_resource(identity).await
    }

    async fn delete_collection(
        &self,
        collection: &str,
        resources: Option<&[Resource]>,
    ) -> Result<Vec<Resource>> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;
        self.inner.delete_collection(collection, resources).await
    }
}
