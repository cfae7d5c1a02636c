use axum::Extension;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::auth::{AuthContext, CompanyContext};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::AccessLevel;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserView {
    pub user_id: String,
    pub access_level: AccessLevel,
    pub has_access: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTestResponse {
    pub message: &'static str,
    pub user: AuthUserView,
    pub experience_id: String,
    pub timestamp: String,
}

impl AuthTestResponse {
    fn new(message: &'static str, ctx: AuthContext) -> Self {
        Self {
            message,
            user: AuthUserView {
                user_id: ctx.user_id,
                access_level: ctx.access_level,
                has_access: ctx.has_access,
            },
            experience_id: ctx.experience_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// GET /api/auth/test - echo the resolved context
pub async fn auth_test_get(Extension(ctx): Extension<AuthContext>) -> ApiResult<AuthTestResponse> {
    Ok(ApiResponse::success(AuthTestResponse::new("Authentication successful", ctx)))
}

/// POST /api/auth/test - same, behind `require_admin`
pub async fn auth_test_post(Extension(ctx): Extension<AuthContext>) -> ApiResult<AuthTestResponse> {
    Ok(ApiResponse::success(AuthTestResponse::new("Admin authentication successful", ctx)))
}

/// GET /api/auth/company - company access probe, behind `require_admin`
pub async fn company_access(Extension(ctx): Extension<CompanyContext>) -> ApiResult<CompanyContext> {
    Ok(ApiResponse::success(ctx))
}
