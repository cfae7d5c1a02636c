use std::sync::Arc;

use axum::http::HeaderMap;

use super::{AuthError, Principal};
use crate::host::{HostError, HostPlatform, USER_TOKEN_HEADER};

/// Turns the host-issued token on a request into a [`Principal`].
///
/// Every call goes to the host platform; positive results are not cached.
#[derive(Clone)]
pub struct IdentityVerifier {
    host: Arc<dyn HostPlatform>,
}

impl IdentityVerifier {
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self { host }
    }

    pub async fn verify_token(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = extract_token(headers)?;

        match self.host.verify_user_token(token).await {
            Ok(user_id) => Ok(Principal::new(user_id)),
            Err(HostError::InvalidToken(reason)) => {
                tracing::debug!("Token rejected: {}", reason);
                Err(AuthError::Unauthenticated(reason))
            }
            Err(other) => Err(AuthError::VerifierUnavailable(other.to_string())),
        }
    }
}

/// Extract the user token from its reserved header
fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(USER_TOKEN_HEADER)
        .ok_or_else(|| AuthError::Unauthenticated("Missing user token header".to_string()))?;

    let token = value
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("Invalid user token header".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::Unauthenticated("Empty user token".to_string()));
    }
    Ok(token)
}
