use crate::{
    error::StoreError,
    store::{ObjectMeta, ObjectStore},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Filesystem-backed object store rooted at a directory (a locally
/// mounted container). Writes go to a temporary sibling first and are
/// published with an atomic rename, so readers never observe a
/// half-written object.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsObjectStore { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.clone();
        tmp.set_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let mut out = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // An absent root is an empty store, not an error.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound && dir == self.root => {
                    return Ok(out);
                }
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    stack.push(path);
                } else if let Some(key) = key_of(&self.root, &path) {
                    if key.starts_with(prefix) && !key.ends_with(".tmp") {
                        out.push(ObjectMeta {
                            key,
                            size: meta.len(),
                        });
                    }
                }
            }
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}

fn key_of(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store
            .put("orders/batch_00000.csv", Bytes::from_static(b"a,b\n1,2\n"))
            .await
            .unwrap();
        store
            .put("orders/batch_00001.csv", Bytes::from_static(b"a,b\n3,4\n"))
            .await
            .unwrap();

        let body = store.get("orders/batch_00000.csv").await.unwrap();
        assert_eq!(&body[..], b"a,b\n1,2\n");

        let listed = store.list("orders/").await.unwrap();
        assert_eq!(
            listed.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            vec!["orders/batch_00000.csv", "orders/batch_00001.csv"]
        );
    }

    #[tokio::test]
    async fn put_overwrites_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store
            .put("t/batch_00000.csv", Bytes::from_static(b"first"))
            .await
            .unwrap();
        store
            .put("t/batch_00000.csv", Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_eq!(&store.get("t/batch_00000.csv").await.unwrap()[..], b"second");
        assert_eq!(store.list("t/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_an_empty_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("missing"));
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store
            .put("../escape.csv", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
