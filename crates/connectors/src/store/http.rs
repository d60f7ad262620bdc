use crate::{
    error::StoreError,
    store::{ObjectMeta, ObjectStore},
};
use async_trait::async_trait;
use bytes::Bytes;

/// Object store spoken to through an HTTP gateway: `PUT /{key}`,
/// `GET /{key}`, `GET /?prefix=..` returning a JSON array of object
/// descriptors. This is the shape storage proxies in front of cloud
/// containers expose.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str) -> Self {
        HttpObjectStore {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.endpoint)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StoreError> {
        self.client
            .put(self.object_url(key))
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let response = self.client.get(self.object_url(key)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(response.error_for_status()?.bytes().await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let url = format!("{}/?prefix={prefix}", self.endpoint);
        let mut listed: Vec<ObjectMeta> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        listed.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listed)
    }
}
