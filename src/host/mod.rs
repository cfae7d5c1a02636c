//! Client side of the host platform: identity tokens and access checks.
//!
//! The rest of the crate talks to [`HostPlatform`]; [`HostClient`] is the
//! production implementation over HTTP.

pub mod client;
pub mod token;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AccessDecision;

pub use client::HostClient;
pub use token::TokenVerifier;

/// Header the host platform uses to carry the caller's identity token.
pub const USER_TOKEN_HEADER: &str = "x-whop-user-token";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Invalid user token: {0}")]
    InvalidToken(String),

    /// The host answered with a definitive refusal.
    #[error("Access denied by host platform")]
    Denied,

    #[error("Host platform request failed: {0}")]
    Transport(String),

    #[error("Host platform did not answer before the deadline")]
    Timeout,

    #[error("Host platform returned unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("Could not decode host platform response: {0}")]
    Decode(String),

    #[error("Host client misconfigured: {0}")]
    Config(String),
}

/// Operations the service needs from the host platform.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Validates an identity token and returns the user id it was issued to.
    async fn verify_user_token(&self, token: &str) -> Result<String, HostError>;

    async fn check_experience_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, HostError>;

    async fn check_company_access(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<AccessDecision, HostError>;
}
