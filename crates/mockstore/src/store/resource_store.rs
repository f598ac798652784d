use super::backend::StorageBackend;
use super::DataStore;
use crate::error::Result;
use crate::identity::{normalize_collection, MatchOptions, ResourceIdentity};
use crate::resource::{merge_value, Resource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub struct ResourceStore<B: StorageBackend> {
    backend: B,
    options: MatchOptions,
}

impl<B: StorageBackend> ResourceStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: MatchOptions::default(),
        }
    }

    /// Comparison rules applied to every identity match made by this store.
    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stamp `resource`, fold any existing record with the same identity into it,
    /// and append it to `records`.
    fn upsert(
        &self,
        records: &mut Vec<Resource>,
        mut resource: Resource,
        now: DateTime<Utc>,
    ) -> Resource {
        resource.created_on = Some(now);
        resource.modified_on = Some(now);

        let existing = records
            .iter()
            .position(|r| r.identity().matches(resource.identity(), self.options));

        if let Some(idx) = existing {
            let existing = records.remove(idx);
            resource.created_on = existing.created_on;

            let mut data = existing.data;
            merge_value(&mut data, resource.data);
            resource.data = data;
        }

        records.push(resource.clone());
        resource
    }

    async fn commit(&self, collection: &str, records: &[Resource]) -> Result<()> {
        if let Err(e) = self.backend.commit(collection, records).await {
            warn!(collection, error = %e, "commit failed");
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl<B: StorageBackend> DataStore for ResourceStore<B> {
    async fn save_resource(&self, resource: Resource) -> Result<Resource> {
        let collection = resource.collection().to_string();
        let mut records = self.backend.open(&collection).await?;

        let saved = self.upsert(&mut records, resource, Utc::now());
        self.commit(&collection, &records).await?;

        debug!(path = %saved, "saved resource");
        Ok(saved)
    }

    async fn save_collection(
        &self,
        collection: &str,
        resources: Vec<Resource>,
    ) -> Result<Vec<Resource>> {
        let collection = normalize_collection(collection);
        let mut records = self.backend.open(&collection).await?;

        if !resources.is_empty() {
            let now = Utc::now();
            let count = resources.len();
            for mut resource in resources {
                let identity = resource.identity().with_collection(&collection);
                resource.set_identity(identity);
                self.upsert(&mut records, resource, now);
            }
            self.commit(&collection, &records).await?;
            debug!(collection = %collection, count, "saved collection");
        }

        Ok(records
            .into_iter()
            .filter(|r| r.identity().in_collection(&collection, self.options))
            .collect())
    }

    async fn get_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>> {
        let records = self.backend.open(identity.collection()).await?;
        let found = records
            .into_iter()
            .find(|r| r.identity().matches(identity, self.options));

        debug!(path = %identity, found = found.is_some(), "get resource");
        Ok(found)
    }

    async fn get_collection(&self, collection: &str) -> Result<Vec<Resource>> {
        let collection = normalize_collection(collection);
        let records = self.backend.open(&collection).await?;
        let members: Vec<Resource> = records
            .into_iter()
            .filter(|r| r.identity().in_collection(&collection, self.options))
            .collect();

        debug!(collection = %collection, count = members.len(), "get collection");
        Ok(members)
    }

    async fn delete_resource(&self, identity: &ResourceIdentity) -> Result<Option<Resource>> {
        let collection = identity.collection();
        let mut records = self.backend.open(collection).await?;

        let Some(idx) = records
            .iter()
            .position(|r| r.identity().matches(identity, self.options))
        else {
            debug!(path = %identity, "nothing to delete");
            return Ok(None);
        };

        let removed = records.remove(idx);
        self.commit(collection, &records).await?;

        debug!(path = %removed, "deleted resource");
        Ok(Some(removed))
    }

    async fn delete_collection(
        &self,
        collection: &str,
        resources: Option<&[Resource]>,
    ) -> Result<Vec<Resource>> {
        let collection = normalize_collection(collection);
        let records = self.backend.open(&collection).await?;

        let targets: Option<Vec<String>> = resources.map(|items| {
            items
                .iter()
                .map(|item| item.identity().with_collection(&collection).key(self.options))
                .collect()
        });

        let (removed, kept): (Vec<Resource>, Vec<Resource>) =
            records.into_iter().partition(|r| match &targets {
                Some(keys) => keys.contains(&r.identity().key(self.options)),
                None => r.identity().in_collection(&collection, self.options),
            });

        if !removed.is_empty() {
            self.commit(&collection, &kept).await?;
        }

        debug!(collection = %collection, count = removed.len(), "deleted collection");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    fn make_store() -> ResourceStore<MemBackend> {
        ResourceStore::with_backend(MemBackend::new())
    }

    fn id(path: &str) -> ResourceIdentity {
        ResourceIdentity::from_path(path)
    }

    // --- Save ---

    #[tokio::test]
    async fn test_save_then_get() {
        let store = make_store();
        let saved = store
            .save_resource(Resource::in_collection("/users", "/jdoe", json!({"name": "J"})).unwrap())
            .await
            .unwrap();
        assert!(saved.created_on().is_some());

        let found = store.get_resource(&id("/users/jdoe")).await.unwrap().unwrap();
        assert_eq!(found.data, json!({"name": "J"}));
        assert_eq!(found.created_on(), found.modified_on());
    }

    #[tokio::test]
    async fn test_second_save_merges() {
        let store = make_store();
        let first = store
            .save_resource(Resource::with_data("/users/jdoe", json!({"name": "J"})))
            .await
            .unwrap();
        let second = store
            .save_resource(Resource::with_data("/users/jdoe", json!({"age": 42})))
            .await
            .unwrap();

        assert_eq!(second.data, json!({"name": "J", "age": 42}));
        assert_eq!(second.created_on(), first.created_on());
        assert!(second.modified_on() >= first.modified_on());

        let all = store.get_collection("/users").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].data, json!({"name": "J", "age": 42}));
    }

    #[tokio::test]
    async fn test_save_with_different_kind_replaces() {
        let store = make_store();
        store
            .save_resource(Resource::with_data("/users/jdoe", json!({"name": "J"})))
            .await
            .unwrap();
        let saved = store
            .save_resource(Resource::with_data("/users/jdoe", json!("plain text")))
            .await
            .unwrap();
        assert_eq!(saved.data, json!("plain text"));
    }

    #[tokio::test]
    async fn test_save_matches_case_insensitively_by_default() {
        let store = make_store();
        store
            .save_resource(Resource::with_data("/Users/JDoe", json!({"a": 1})))
            .await
            .unwrap();
        store
            .save_resource(Resource::with_data("/users/jdoe/", json!({"b": 2})))
            .await
            .unwrap();

        let all = store.get_collection("/users").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].data, json!({"a": 1, "b": 2}));
        assert_eq!(all[0].to_string(), "/users/jdoe/");
    }

    #[tokio::test]
    async fn test_case_sensitive_store_keeps_both() {
        let store = make_store().with_options(MatchOptions::new(true, false));
        store.save_resource(Resource::new("/users/JDoe")).await.unwrap();
        store.save_resource(Resource::new("/users/jdoe")).await.unwrap();

        assert_eq!(store.get_collection("/users").await.unwrap().len(), 2);
        assert!(store.get_resource(&id("/USERS/jdoe")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_backend_untouched() {
        let store = make_store();
        store
            .save_resource(Resource::with_data("/users/jdoe", json!({"v": 1})))
            .await
            .unwrap();

        store.backend().set_simulate_write_error(true);
        let err = store
            .save_resource(Resource::with_data("/users/jdoe", json!({"v": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        store.backend().set_simulate_write_error(false);
        let found = store.get_resource(&id("/users/jdoe")).await.unwrap().unwrap();
        assert_eq!(found.data, json!({"v": 1}));
    }

    // --- Save collection ---

    #[tokio::test]
    async fn test_save_collection_rewrites_collection() {
        let store = make_store();
        store
            .save_resource(Resource::with_data("/users/alice", json!({"n": 1})))
            .await
            .unwrap();

        let batch = vec![
            Resource::with_data("/people/bob", json!({"n": 2})),
            Resource::with_data("/alice", json!({"m": 3})),
        ];
        let all = store.save_collection("users/", batch).await.unwrap();

        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.collection() == "/users"));
        let alice = all.iter().find(|r| r.name() == "/alice").unwrap();
        assert_eq!(alice.data, json!({"n": 1, "m": 3}));
        assert!(store.get_collection("/people").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_collection_single_timestamp() {
        let store = make_store();
        let batch = vec![Resource::new("/a"), Resource::new("/b")];
        let all = store.save_collection("/letters", batch).await.unwrap();
        assert_eq!(all[0].created_on(), all[1].created_on());
    }

    // --- Get ---

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = make_store();
        assert!(store.get_resource(&id("/users/ghost")).await.unwrap().is_none());
        assert!(store.get_collection("/users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_collection_filters_by_collection() {
        let store = make_store();
        store.save_resource(Resource::new("/users/a")).await.unwrap();
        store.save_resource(Resource::new("/users/b")).await.unwrap();
        store.save_resource(Resource::new("/users/a/orders/1")).await.unwrap();
        store.save_resource(Resource::new("/orders/1")).await.unwrap();

        let users = store.get_collection("/users").await.unwrap();
        let names: Vec<&str> = users.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_strict_store_distinguishes_trailing_slash() {
        let store = make_store().with_options(MatchOptions::new(false, true));
        store.save_resource(Resource::new("/users/jdoe/")).await.unwrap();

        assert!(store.get_resource(&id("/users/jdoe")).await.unwrap().is_none());
        assert!(store.get_resource(&id("/users/jdoe/")).await.unwrap().is_some());
    }

    // --- Delete ---

    #[tokio::test]
    async fn test_delete_resource() {
        let store = make_store();
        store
            .save_resource(Resource::with_data("/users/jdoe", json!(1)))
            .await
            .unwrap();

        let removed = store.delete_resource(&id("/users/JDOE")).await.unwrap().unwrap();
        assert_eq!(removed.data, json!(1));
        assert!(store.get_resource(&id("/users/jdoe")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_skips_commit() {
        let store = make_store();
        store.backend().set_simulate_write_error(true);
        // A commit would fail, so success proves none was attempted
        let removed = store.delete_resource(&id("/users/ghost")).await.unwrap();
        assert!(removed.is_none());
        let removed = store.delete_collection("/users", None).await.unwrap();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn test_delete_whole_collection() {
        let store = make_store();
        store.save_resource(Resource::new("/users/a")).await.unwrap();
        store.save_resource(Resource::new("/users/b")).await.unwrap();
        store.save_resource(Resource::new("/orders/1")).await.unwrap();

        let before = store.get_collection("/users").await.unwrap();
        let removed = store.delete_collection("/users", None).await.unwrap();
        assert_eq!(removed, before);
        assert!(store.get_collection("/users").await.unwrap().is_empty());
        assert_eq!(store.get_collection("/orders").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_named_resources_from_collection() {
        let store = make_store();
        for name in ["a", "b", "c"] {
            store
                .save_resource(Resource::new(format!("/users/{}", name)))
                .await
                .unwrap();
        }

        // Only the names count; collections are rewritten to the target
        let targets = vec![Resource::new("/elsewhere/a"), Resource::new("/C"), Resource::new("/zz")];
        let removed = store
            .delete_collection("/users", Some(targets.as_slice()))
            .await
            .unwrap();

        let removed_names: Vec<&str> = removed.iter().map(|r| r.name()).collect();
        assert_eq!(removed_names, vec!["/a", "/c"]);
        let left = store.get_collection("/users").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name(), "/b");
    }
}
