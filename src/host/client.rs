use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{HostError, HostPlatform, TokenVerifier};
use crate::auth::AccessDecision;
use crate::config::AppConfig;
use crate::types::AccessLevel;

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    has_access: bool,
    access_level: String,
}

/// HTTP client for the host platform's app API.
///
/// One instance is built at boot and shared; `reqwest::Client` pools
/// connections internally.
pub struct HostClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    deadline: Duration,
    local: Option<TokenVerifier>,
}

impl HostClient {
    pub fn new(config: &AppConfig) -> Result<Self, HostError> {
        let deadline = config.request_deadline();
        let http = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| HostError::Config(e.to_string()))?;

        let local = match &config.host.token_public_key {
            Some(pem) => Some(TokenVerifier::from_pem(pem, config.host.app_id.as_deref())?),
            None => None,
        };

        Ok(Self {
            http,
            base_url: config.host.api_base_url.clone(),
            api_key: config.host.api_key.clone(),
            deadline,
            local,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Bounds a remote call by the configured deadline.
    async fn with_deadline<T, F>(&self, call: F) -> Result<T, HostError>
    where
        F: Future<Output = Result<T, HostError>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(HostError::Timeout),
        }
    }

    async fn fetch_access(&self, path: String, user_id: &str) -> Result<AccessDecision, HostError> {
        self.with_deadline(async {
            let response = self
                .http
                .get(self.url(&path))
                .bearer_auth(&self.api_key)
                .query(&[("user_id", user_id)])
                .send()
                .await
                .map_err(transport_error)?;

            match response.status() {
                status if status.is_success() => {
                    let body: AccessResponse = response
                        .json()
                        .await
                        .map_err(|e| HostError::Decode(e.to_string()))?;
                    let level: AccessLevel = body.access_level.parse().map_err(HostError::Decode)?;
                    Ok(AccessDecision::new(body.has_access, level))
                }
                StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(HostError::Denied),
                status => Err(HostError::UnexpectedStatus(status.as_u16())),
            }
        })
        .await
    }
}

fn transport_error(err: reqwest::Error) -> HostError {
    if err.is_timeout() {
        HostError::Timeout
    } else {
        HostError::Transport(err.to_string())
    }
}

#[async_trait]
impl HostPlatform for HostClient {
    async fn verify_user_token(&self, token: &str) -> Result<String, HostError> {
        if let Some(local) = &self.local {
            return local.verify(token);
        }

        self.with_deadline(async {
            let response = self
                .http
                .post(self.url("app/users/verify-token"))
                .bearer_auth(&self.api_key)
                .json(&VerifyTokenRequest { token })
                .send()
                .await
                .map_err(transport_error)?;

            match response.status() {
                status if status.is_success() => {
                    let body: VerifyTokenResponse = response
                        .json()
                        .await
                        .map_err(|e| HostError::Decode(e.to_string()))?;
                    Ok(body.user_id)
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(HostError::InvalidToken(format!("host rejected token ({})", response.status())))
                }
                status => Err(HostError::UnexpectedStatus(status.as_u16())),
            }
        })
        .await
    }

    async fn check_experience_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, HostError> {
        self.fetch_access(format!("app/experiences/{}/access", experience_id), user_id)
            .await
    }

    async fn check_company_access(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<AccessDecision, HostError> {
        self.fetch_access(format!("app/companies/{}/access", company_id), user_id)
            .await
    }
}
