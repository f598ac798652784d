use super::backend::StorageBackend;
use crate::error::{Result, StoreError};
use crate::resource::Resource;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Filesystem backend: one pretty-printed JSON array per collection.
///
/// The last segment of a collection names the file, the segments before it name
/// nested directories, all lower-cased:
///
/// ```text
/// /Users/JDoe/Orders  →  <base>/users/jdoe/orders.json
/// /users              →  <base>/users.json
/// (root)              →  <base>/.json
/// ```
pub struct FsBackend {
    base_dir: PathBuf,
}

impl FsBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Backend rooted at the process's current working directory.
    pub fn in_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the file for `collection`.
    pub fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        let (parents, _) = split_collection(collection)?;
        let mut dir = self.base_dir.clone();
        for segment in parents {
            dir.push(segment.to_lowercase());
        }
        Ok(dir)
    }

    /// JSON file holding every record of `collection`.
    pub fn collection_file(&self, collection: &str) -> Result<PathBuf> {
        let (_, file_stem) = split_collection(collection)?;
        let dir = self.collection_dir(collection)?;
        Ok(dir.join(format!("{}.json", file_stem.to_lowercase())))
    }
}

/// Split a collection into its directory segments and file stem, refusing
/// segments that would step outside the base directory.
fn split_collection(collection: &str) -> Result<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = collection.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(bad) = segments.iter().find(|s| **s == "." || **s == "..") {
        return Err(StoreError::InvalidArgument(format!(
            "Collection path segment '{}' is not allowed: {}",
            bad, collection
        )));
    }
    let file_stem = segments.pop().unwrap_or("");
    Ok((segments, file_stem))
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn open(&self, collection: &str) -> Result<Vec<Resource>> {
        let path = self.collection_file(collection)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(collection, path = %path.display(), "collection file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let resources = Resource::parse_list(&content)?;
        debug!(collection, path = %path.display(), count = resources.len(), "opened collection file");
        Ok(resources)
    }

    async fn commit(&self, collection: &str, resources: &[Resource]) -> Result<()> {
        let dir = self.collection_dir(collection)?;
        let path = self.collection_file(collection)?;
        let content = serde_json::to_string_pretty(resources)?;

        fs::create_dir_all(&dir).await?;

        // Atomic write: readers see either the old or the new file, never a partial one
        let tmp_file = dir.join(format!(".mockstore-{}.tmp", Uuid::new_v4()));
        let written = match fs::write(&tmp_file, content).await {
            Ok(()) => fs::rename(&tmp_file, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(collection, path = %path.display(), error = %e, "failed to replace collection file");
            if let Err(cleanup) = fs::remove_file(&tmp_file).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp_file.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(StoreError::Io(e));
        }

        debug!(collection, path = %path.display(), count = resources.len(), "committed collection file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FsBackend::new(dir.path());
        (dir, backend)
    }

    #[test]
    fn test_path_mapping() {
        let (dir, backend) = setup();
        assert_eq!(
            backend.collection_file("/Users/JDoe/Orders").unwrap(),
            dir.path().join("users").join("jdoe").join("orders.json")
        );
        assert_eq!(
            backend.collection_dir("/Users/JDoe/Orders").unwrap(),
            dir.path().join("users").join("jdoe")
        );
        assert_eq!(
            backend.collection_file("/users").unwrap(),
            dir.path().join("users.json")
        );
    }

    #[test]
    fn test_root_collection_maps_to_dot_json() {
        let (dir, backend) = setup();
        assert_eq!(
            backend.collection_file("").unwrap(),
            dir.path().join(".json")
        );
    }

    #[test]
    fn test_traversal_segments_rejected() {
        let (_dir, backend) = setup();
        let err = backend.collection_file("/users/../../etc").unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(backend.collection_file("/./users").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let (_dir, backend) = setup();
        let opened = backend.open("/nothing/here").await.unwrap();
        assert!(opened.is_empty());
    }

    #[tokio::test]
    async fn test_commit_creates_directories_and_file() {
        let (dir, backend) = setup();
        let resources = vec![Resource::with_data("/users/JDoe/orders/1234", json!({"qty": 2}))];
        backend
            .commit("/users/JDoe/orders", &resources)
            .await
            .unwrap();

        let file = dir.path().join("users").join("jdoe").join("orders.json");
        assert!(file.exists());

        let opened = backend.open("/users/JDoe/orders").await.unwrap();
        assert_eq!(opened, resources);
    }

    #[tokio::test]
    async fn test_commit_leaves_no_tmp_files() {
        let (dir, backend) = setup();
        backend
            .commit("/users", &[Resource::new("/users/a")])
            .await
            .unwrap();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let (dir, backend) = setup();
        std::fs::write(dir.path().join("users.json"), "{ not json").unwrap();

        let err = backend.open("/users").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(err.is_backend_error());
    }

    #[tokio::test]
    async fn test_commit_overwrites() {
        let (_dir, backend) = setup();
        backend
            .commit("/users", &[Resource::new("/users/a"), Resource::new("/users/b")])
            .await
            .unwrap();
        backend
            .commit("/users", &[Resource::new("/users/b")])
            .await
            .unwrap();

        let opened = backend.open("/users").await.unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].name(), "/b");
    }
}
