use axum::{extract::Request, middleware::Next, response::{IntoResponse, Response}};

use crate::auth::{AuthContext, CompanyContext};
use crate::error::ApiError;

/// Lets the request through only when the gate resolved an admin caller,
/// for either an experience or a company.
///
/// Must run after `auth_gate_middleware`; without a resolved context the
/// request is refused.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let extensions = request.extensions();
    let is_admin = match (extensions.get::<AuthContext>(), extensions.get::<CompanyContext>()) {
        (Some(ctx), _) => ctx.is_admin(),
        (None, Some(ctx)) => ctx.is_admin(),
        (None, None) => false,
    };

    if !is_admin {
        tracing::warn!(path = %request.uri().path(), "Admin access required");
        return ApiError::forbidden("Admin access required").into_response();
    }

    next.run(request).await
}
