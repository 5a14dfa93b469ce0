//! HS256 JWT verification.
//!
//! Tokens must carry `sub` and `exp`. When an audience or issuer is
//! configured the corresponding claim must match it.

use super::{AuthError, Credential, TokenVerifier, Unverified, Verified};
use crate::config::ConfigError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims read from a bearer JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller identifier
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// JWT validator for bearer tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier.
    ///
    /// Returns an error if the secret is empty.
    pub fn new(
        secret: impl AsRef<[u8]>,
        audience: Option<String>,
        issuer: Option<String>,
    ) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::InvalidAuth(
                "JWT secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Verify and decode a token.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidAudience => "Invalid audience",
                    ErrorKind::InvalidIssuer => "Invalid issuer",
                    ErrorKind::InvalidToken => "Invalid token",
                    _ => "Token validation failed",
                };
                AuthError::InvalidToken {
                    reason: reason.to_string(),
                }
            })
    }
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("audience", &self.validation.aud)
            .field("issuer", &self.validation.iss)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        credential: Credential<Unverified>,
    ) -> Result<Credential<Verified>, AuthError> {
        let claims = self.decode_claims(credential.raw_value())?;
        Ok(credential.into_verified(claims.sub))
    }
}
