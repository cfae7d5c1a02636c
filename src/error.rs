// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::profile::ProfileError;
use crate::store::StoreError;
use crate::upload::UploadError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidPayload {
        message: String,
        details: Option<Value>,
    },

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    Internal(String),

    // 502 Bad Gateway (remote collaborators)
    VerifierUnavailable(String),
    ResolverUnavailable(String),
    UploadFailed(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidPayload { .. } => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
            ApiError::VerifierUnavailable(_) => 502,
            ApiError::ResolverUnavailable(_) => 502,
            ApiError::UploadFailed(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidPayload { message, .. } => message,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Internal(msg) => msg,
            ApiError::VerifierUnavailable(msg) => msg,
            ApiError::ResolverUnavailable(msg) => msg,
            ApiError::UploadFailed(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for log correlation
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL",
            ApiError::VerifierUnavailable(_) => "VERIFIER_UNAVAILABLE",
            ApiError::ResolverUnavailable(_) => "RESOLVER_UNAVAILABLE",
            ApiError::UploadFailed(_) => "UPLOAD_FAILED",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to the failure envelope
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
            "status": self.status_code(),
        });

        if let ApiError::InvalidPayload { details: Some(details), .. } = self {
            body["details"] = details.clone();
        }

        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_payload(message: impl Into<String>, details: Option<Value>) -> Self {
        ApiError::InvalidPayload {
            message: message.into(),
            details,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal() -> Self {
        ApiError::Internal("Internal server error".to_string())
    }

    pub fn missing_experience_id() -> Self {
        ApiError::bad_request("experienceId is required")
    }
}

// Convert other error types to ApiError
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(_) => {
                ApiError::unauthenticated("Invalid or missing authentication token")
            }
            AuthError::Forbidden(msg) => ApiError::forbidden(msg),
            AuthError::VerifierUnavailable(cause) => {
                tracing::error!("Identity verification unavailable: {}", cause);
                ApiError::VerifierUnavailable("Identity service unavailable".to_string())
            }
            AuthError::ResolverUnavailable(cause) => {
                tracing::error!("Access resolution unavailable: {}", cause);
                ApiError::ResolverUnavailable("Access service unavailable".to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(msg) => {
                tracing::error!("Store connection error: {}", msg);
                ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Store error: {}", other);
                ApiError::internal()
            }
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Forbidden(msg) => ApiError::forbidden(msg),
            ProfileError::NotFound => ApiError::not_found("Profile not found"),
            ProfileError::InvalidPayload(violations) => ApiError::invalid_payload(
                "Invalid profile data",
                Some(violations.to_json()),
            ),
            ProfileError::Conflict(msg) => ApiError::conflict(msg),
            ProfileError::Store(e) => e.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Failed(cause) => {
                tracing::error!("Blob upload failed: {}", cause);
                ApiError::UploadFailed("Failed to upload file. Please try again.".to_string())
            }
            UploadError::Timeout => {
                tracing::error!("Blob upload exceeded its deadline");
                ApiError::UploadFailed("Failed to upload file. Please try again.".to_string())
            }
            policy => ApiError::invalid_payload(policy.to_string(), None),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), "request failed: {}", self.message());
        }
        (status, Json(self.to_json())).into_response()
    }
}
