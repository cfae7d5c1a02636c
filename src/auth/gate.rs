use std::sync::Arc;

use axum::http::HeaderMap;

use super::{AccessDecision, AccessResolver, AuthContext, AuthError, CompanyContext, IdentityVerifier};
use crate::host::HostPlatform;

/// Predicate applied after access has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// `has_access` must be true.
    Access,
    /// `has_access` and `access_level = admin`.
    Admin,
}

impl Requirement {
    pub fn check(self, decision: &AccessDecision) -> Result<(), AuthError> {
        if !decision.has_access {
            return Err(AuthError::Forbidden("Access denied to this experience".to_string()));
        }
        if self == Requirement::Admin && !decision.is_admin() {
            return Err(AuthError::Forbidden("Admin access required".to_string()));
        }
        Ok(())
    }
}

/// Single guard used by every protected entry point: identity, then access,
/// then the requirement predicate. Steps never run out of order and a
/// failed step stops the pipeline.
#[derive(Clone)]
pub struct AuthGate {
    verifier: IdentityVerifier,
    resolver: AccessResolver,
}

impl AuthGate {
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self {
            verifier: IdentityVerifier::new(host.clone()),
            resolver: AccessResolver::new(host),
        }
    }

    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        experience_id: &str,
        requirement: Requirement,
    ) -> Result<AuthContext, AuthError> {
        let principal = self.verifier.verify_token(headers).await?;
        let decision = self
            .resolver
            .resolve_access(principal.user_id(), experience_id)
            .await?;

        if let Err(denied) = requirement.check(&decision) {
            tracing::warn!(
                user_id = principal.user_id(),
                experience_id,
                access_level = %decision.access_level,
                "Experience access denied"
            );
            return Err(denied);
        }

        Ok(AuthContext::new(principal, experience_id, decision))
    }

    pub async fn authorize_company(
        &self,
        headers: &HeaderMap,
        company_id: &str,
        requirement: Requirement,
    ) -> Result<CompanyContext, AuthError> {
        let principal = self.verifier.verify_token(headers).await?;
        let decision = self
            .resolver
            .resolve_company_access(principal.user_id(), company_id)
            .await?;

        if let Err(denied) = requirement.check(&decision) {
            tracing::warn!(
                user_id = principal.user_id(),
                company_id,
                access_level = %decision.access_level,
                "Company access denied"
            );
            return Err(match denied {
                AuthError::Forbidden(_) if !decision.has_access => {
                    AuthError::Forbidden("Access denied to this company".to_string())
                }
                other => other,
            });
        }

        Ok(CompanyContext {
            user_id: principal.user_id().to_string(),
            company_id: company_id.to_string(),
            has_access: decision.has_access,
            access_level: decision.access_level,
        })
    }
}
