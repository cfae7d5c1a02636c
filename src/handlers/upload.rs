use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Extension,
};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::upload::{UploadBroker, UploadError, UploadFile, UploadedArtifact};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub artifact: UploadedArtifact,
    pub message: &'static str,
}

/// POST /api/upload - multipart pitch deck upload
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let multipart = multipart.map_err(|e| UploadError::Malformed(e.body_text()))?;
    let file = read_file_field(&state.uploads, multipart).await?;
    let artifact = state.uploads.upload(&ctx, file).await?;

    Ok(ApiResponse::success(UploadResponse {
        artifact,
        message: "File uploaded successfully",
    }))
}

/// Reads the `file` field, checking the declared type before the body and
/// stopping as soon as the size cap is exceeded.
async fn read_file_field(broker: &UploadBroker, mut multipart: Multipart) -> Result<UploadFile, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| field_error(broker, e))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("pitch-deck").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        broker.check_type(&content_type)?;

        let mut body = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| field_error(broker, e))? {
            broker.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }

        return Ok(UploadFile {
            filename,
            content_type,
            body: Bytes::from(body),
        });
    }

    Err(UploadError::MissingFile.into())
}

/// Body-limit failures surface as the size policy, not a parse error.
fn field_error(broker: &UploadBroker, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::TooLarge { max_bytes: broker.max_bytes() }.into();
    }
    UploadError::Malformed(err.body_text()).into()
}
