use std::sync::Arc;

use super::{AccessDecision, AuthError};
use crate::host::{HostError, HostPlatform};

/// Resolves what a verified user may do in an experience or company.
///
/// A definitive refusal from the host is a successful `no_access` decision,
/// not an error; only transport-level failures surface as errors.
#[derive(Clone)]
pub struct AccessResolver {
    host: Arc<dyn HostPlatform>,
}

impl AccessResolver {
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self { host }
    }

    pub async fn resolve_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, AuthError> {
        let result = self.host.check_experience_access(user_id, experience_id).await;
        map_decision(result)
    }

    pub async fn resolve_company_access(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<AccessDecision, AuthError> {
        let result = self.host.check_company_access(user_id, company_id).await;
        map_decision(result)
    }
}

fn map_decision(result: Result<AccessDecision, HostError>) -> Result<AccessDecision, AuthError> {
    match result {
        Ok(decision) => Ok(AccessDecision::new(decision.has_access, decision.access_level)),
        Err(HostError::Denied) => Ok(AccessDecision::denied()),
        Err(other) => Err(AuthError::ResolverUnavailable(other.to_string())),
    }
}
