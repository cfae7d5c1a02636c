use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::UploadError;
use crate::config::BlobConfig;

const BLOB_API_VERSION: &str = "7";

/// A stored object and its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub url: String,
    pub pathname: String,
}

/// Upload sink returning a public URL for every stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob, UploadError>;
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
    #[serde(default)]
    pathname: Option<String>,
}

/// Vercel Blob over its HTTP API. Objects are public and get a random
/// suffix, so repeated uploads of one filename never collide.
pub struct HttpBlobStore {
    http: Client,
    api_url: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(config: &BlobConfig) -> Result<Self, UploadError> {
        let http = Client::builder()
            .build()
            .map_err(|e| UploadError::Failed(e.to_string()))?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.credentials.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob, UploadError> {
        let response = self
            .http
            .put(format!("{}/{}", self.api_url, pathname))
            .bearer_auth(&self.token)
            .header("x-api-version", BLOB_API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "1")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = response.text().await.unwrap_or_default();
            return Err(UploadError::Failed(format!("blob store returned {}: {}", status, detail)));
        }

        let stored: PutResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Failed(format!("unreadable blob response: {}", e)))?;

        // A URL that does not parse is as good as no URL.
        url::Url::parse(&stored.url)
            .map_err(|e| UploadError::Failed(format!("blob store returned invalid URL: {}", e)))?;

        Ok(StoredBlob {
            pathname: stored.pathname.unwrap_or_else(|| pathname.to_string()),
            url: stored.url,
        })
    }
}
