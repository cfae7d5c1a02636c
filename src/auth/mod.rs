//! Request authorization: identity verification, access resolution and the
//! gate that composes them for every protected entry point.

pub mod gate;
pub mod resolver;
pub mod verifier;

use serde::Serialize;
use thiserror::Error;

use crate::types::AccessLevel;

pub use gate::{AuthGate, Requirement};
pub use resolver::AccessResolver;
pub use verifier::IdentityVerifier;

/// Failures of the authorization pipeline.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Identity verifier unavailable: {0}")]
    VerifierUnavailable(String),

    #[error("Access resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

impl AuthError {
    pub fn status(&self) -> u16 {
        match self {
            AuthError::Unauthenticated(_) => 401,
            AuthError::Forbidden(_) => 403,
            AuthError::VerifierUnavailable(_) | AuthError::ResolverUnavailable(_) => 502,
        }
    }
}

/// A caller whose token the identity verifier accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: String,
}

impl Principal {
    pub(crate) fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Outcome of an access check. `NoAccess` never carries `has_access = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_access: bool,
    pub access_level: AccessLevel,
}

impl AccessDecision {
    pub fn new(has_access: bool, access_level: AccessLevel) -> Self {
        Self {
            has_access: has_access && access_level != AccessLevel::NoAccess,
            access_level,
        }
    }

    pub fn denied() -> Self {
        Self::new(false, AccessLevel::NoAccess)
    }

    pub fn is_admin(&self) -> bool {
        self.has_access && self.access_level == AccessLevel::Admin
    }
}

/// Verified principal plus its access to one experience, valid for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
    pub experience_id: String,
    pub has_access: bool,
    pub access_level: AccessLevel,
}

impl AuthContext {
    pub(crate) fn new(principal: Principal, experience_id: impl Into<String>, decision: AccessDecision) -> Self {
        Self {
            user_id: principal.user_id,
            experience_id: experience_id.into(),
            has_access: decision.has_access,
            access_level: decision.access_level,
        }
    }

    pub fn decision(&self) -> AccessDecision {
        AccessDecision::new(self.has_access, self.access_level)
    }

    pub fn is_admin(&self) -> bool {
        self.decision().is_admin()
    }
}

/// Verified principal plus its access to a company (admin surfaces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContext {
    pub user_id: String,
    pub company_id: String,
    pub has_access: bool,
    pub access_level: AccessLevel,
}

impl CompanyContext {
    pub fn is_admin(&self) -> bool {
        AccessDecision::new(self.has_access, self.access_level).is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_access_never_grants_access() {
        let decision = AccessDecision::new(true, AccessLevel::NoAccess);
        assert!(!decision.has_access);
        assert!(!decision.is_admin());
    }

    #[test]
    fn admin_requires_access() {
        assert!(AccessDecision::new(true, AccessLevel::Admin).is_admin());
        assert!(!AccessDecision::new(false, AccessLevel::Admin).is_admin());
        assert!(!AccessDecision::new(true, AccessLevel::Customer).is_admin());
    }

    #[test]
    fn context_serializes_camel_case() {
        let ctx = AuthContext::new(
            Principal::new("user_1"),
            "exp_1",
            AccessDecision::new(true, AccessLevel::Customer),
        );
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["userId"], "user_1");
        assert_eq!(value["experienceId"], "exp_1");
        assert_eq!(value["accessLevel"], "customer");
        assert_eq!(value["hasAccess"], true);
    }
}
