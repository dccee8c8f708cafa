//! Read-only object store access for published strategy data

pub mod format;

pub use format::DataFormat;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object store transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("unknown data format: {0}")]
    Format(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// GetObject-style retrieval by key from a single configured bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Object store client speaking the S3-compatible path layout
/// `<endpoint>/<bucket>/<key>` over plain HTTP GET.
pub struct HttpObjectStore {
    endpoint: String,
    bucket: String,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self::with_client(endpoint, bucket, reqwest::Client::new())
    }

    /// Construct with an explicit reqwest client (tests point this at a
    /// wiremock server).
    pub fn with_client(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            client,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(key);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(response.bytes().await?.to_vec())
    }
}
