use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::HostError;

/// Issuer the host platform stamps on user tokens forwarded through its proxy.
pub const USER_TOKEN_ISSUER: &str = "urn:whopcom:exp-proxy";

#[derive(Debug, Deserialize)]
struct UserTokenClaims {
    sub: String,
}

/// Verifies host-issued user tokens locally against the host's ES256 public key.
///
/// Expiry is always enforced; nothing is cached between calls.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_pem(public_key_pem: &str, app_id: Option<&str>) -> Result<Self, HostError> {
        let key = DecodingKey::from_ec_pem(public_key_pem.as_bytes())
            .map_err(|e| HostError::Config(format!("invalid token public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_issuer(&[USER_TOKEN_ISSUER]);
        match app_id {
            Some(app_id) => validation.set_audience(&[app_id]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }

    /// Returns the user id the token was issued to.
    pub fn verify(&self, token: &str) -> Result<String, HostError> {
        let data = decode::<UserTokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| HostError::InvalidToken(e.to_string()))?;

        if data.claims.sub.trim().is_empty() {
            return Err(HostError::InvalidToken("token has no subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}
