use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub mod fs;
pub mod http;
pub mod memory;

/// Descriptor of one stored object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

/// Destination object storage.
///
/// `put` has overwrite semantics: repeating a write under the same key
/// replaces the object, which is what makes batch retries idempotent.
/// Implementations must never leave a partially written object visible
/// under its final key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Lists objects under `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError>;
}
