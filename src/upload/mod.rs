//! Pitch-deck uploads: type and size policy in front of the blob store.

pub mod blob;

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::AuthContext;
use crate::config::AppConfig;

pub use blob::{BlobStore, HttpBlobStore, StoredBlob};

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Invalid file type. Only PDF, PPT, and PPTX files are allowed.")]
    TypeNotAllowed(String),

    #[error("File too large. Maximum size is {}.", describe_limit(.max_bytes))]
    TooLarge { max_bytes: usize },

    #[error("Invalid upload request: {0}")]
    Malformed(String),

    #[error("Blob upload failed: {0}")]
    Failed(String),

    #[error("Blob upload timed out")]
    Timeout,
}

fn describe_limit(max_bytes: &usize) -> String {
    let max_bytes = *max_bytes;
    if max_bytes % MIB == 0 {
        format!("{}MB", max_bytes / MIB)
    } else {
        format!("{} bytes", max_bytes)
    }
}

/// A file received from a client, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

/// What the client gets back for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedArtifact {
    pub url: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Stateless broker: checks policy, then forwards to the blob store under
/// a deadline that grows with the payload size.
#[derive(Clone)]
pub struct UploadBroker {
    sink: Arc<dyn BlobStore>,
    allowed_types: Arc<HashSet<String>>,
    config: Arc<AppConfig>,
}

impl UploadBroker {
    pub fn new(config: Arc<AppConfig>, sink: Arc<dyn BlobStore>) -> Self {
        let allowed_types = config
            .upload
            .allowed_types
            .iter()
            .map(|t| t.to_ascii_lowercase())
            .collect();
        Self {
            sink,
            allowed_types: Arc::new(allowed_types),
            config,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.config.upload.max_bytes
    }

    pub fn check_type(&self, content_type: &str) -> Result<(), UploadError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if self.allowed_types.contains(&essence) {
            Ok(())
        } else {
            Err(UploadError::TypeNotAllowed(content_type.to_string()))
        }
    }

    /// The cap is inclusive: a file of exactly `max_bytes` is accepted.
    pub fn check_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.max_bytes() {
            return Err(UploadError::TooLarge { max_bytes: self.max_bytes() });
        }
        Ok(())
    }

    pub async fn upload(&self, ctx: &AuthContext, file: UploadFile) -> Result<UploadedArtifact, UploadError> {
        if let Err(e) = self.check_type(&file.content_type) {
            warn!(content_type = %file.content_type, "Upload rejected: type not allowed");
            return Err(e);
        }
        self.check_size(file.body.len())?;

        let size = file.body.len();
        let pathname = blob_pathname(&ctx.experience_id, &file.filename);
        let deadline = self.config.upload_deadline(size);

        let stored = tokio::time::timeout(deadline, self.sink.put(&pathname, file.body, &file.content_type))
            .await
            .map_err(|_| UploadError::Timeout)??;

        info!(pathname = %stored.pathname, size, "Pitch deck uploaded");
        Ok(UploadedArtifact {
            url: stored.url,
            filename: file.filename,
            size,
            content_type: file.content_type,
        })
    }
}

/// `pitch-decks/{experience}/{filename}` with anything outside a safe
/// character set replaced.
fn blob_pathname(experience_id: &str, filename: &str) -> String {
    let experience = sanitize_segment(experience_id);
    let name = sanitize_segment(filename.rsplit(['/', '\\']).next().unwrap_or_default());
    let name = if name.trim_matches(['.', '-']).is_empty() {
        "pitch-deck".to_string()
    } else {
        name
    };
    format!("pitch-decks/{}/{}", experience, name)
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' })
        .collect()
}
