//! Principal headers set by the gate middleware for downstream handlers.
//!
//! The names are reserved: whatever a client sends under them is removed
//! before authorization runs, so a value present after the gate was
//! written by the gate.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::types::AccessLevel;

pub const USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const ACCESS_LEVEL: HeaderName = HeaderName::from_static("x-access-level");
pub const HAS_ACCESS: HeaderName = HeaderName::from_static("x-has-access");
pub const EXPERIENCE_ID: HeaderName = HeaderName::from_static("x-experience-id");

pub const RESERVED: [HeaderName; 4] = [USER_ID, ACCESS_LEVEL, HAS_ACCESS, EXPERIENCE_ID];

/// Removes every reserved header, including repeated ones.
pub fn strip(headers: &mut HeaderMap) {
    for name in RESERVED {
        if headers.remove(&name).is_some() {
            tracing::warn!(header = %name, "Dropped client-supplied principal header");
        }
    }
}

pub fn apply(headers: &mut HeaderMap, ctx: &AuthContext) -> Result<(), ApiError> {
    let value = |s: &str| {
        HeaderValue::from_str(s).map_err(|_| {
            tracing::error!("Principal value is not a valid header value");
            ApiError::internal()
        })
    };

    headers.insert(USER_ID, value(&ctx.user_id)?);
    headers.insert(EXPERIENCE_ID, value(&ctx.experience_id)?);
    headers.insert(ACCESS_LEVEL, HeaderValue::from_static(ctx.access_level.as_str()));
    headers.insert(
        HAS_ACCESS,
        HeaderValue::from_static(if ctx.has_access { "true" } else { "false" }),
    );
    Ok(())
}

/// Reads the principal back from the trusted headers.
pub fn read(headers: &HeaderMap) -> Option<AuthContext> {
    let text = |name: &HeaderName| headers.get(name)?.to_str().ok().map(str::to_string);

    let user_id = text(&USER_ID)?;
    let experience_id = text(&EXPERIENCE_ID)?;
    let access_level: AccessLevel = text(&ACCESS_LEVEL)?.parse().ok()?;
    let has_access = text(&HAS_ACCESS)? == "true";

    Some(AuthContext {
        user_id,
        experience_id,
        has_access: has_access && access_level != AccessLevel::NoAccess,
        access_level,
    })
}

/// Extractor for page handlers: the principal as the gate forwarded it.
#[derive(Debug, Clone)]
pub struct TrustedPrincipal(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for TrustedPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        read(&parts.headers).map(TrustedPrincipal).ok_or_else(|| {
            // The gate sets these on every guarded route.
            tracing::error!(path = %parts.uri.path(), "Trusted principal headers missing");
            ApiError::internal()
        })
    }
}
