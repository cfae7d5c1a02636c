use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET / - service banner
pub async fn root() -> ApiResult<serde_json::Value> {
    Ok(ApiResponse::success(json!({
        "name": "Foundry Match",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Founder and investor matching for host platform experiences",
        "endpoints": {
            "auth": "/api/auth/test?experienceId=, /api/auth/company?companyId=",
            "profile": "/api/profile/check, /api/profile/create, /api/profile/:userId",
            "upload": "/api/upload?experienceId=",
            "pages": "/experiences/:experienceId[/onboarding|/profile/create|/discovery]"
        }
    })))
}

/// GET /health - store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.profiles.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true, "data": { "status": "ok" } }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "error": "Database unavailable", "status": 503 })),
            )
        }
    }
}
