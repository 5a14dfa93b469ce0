//! Bearer-token authentication with type-level credential states.
//!
//! A [`Credential`] starts out [`Unverified`]. The only way to obtain a
//! `Credential<Verified>` is through a [`TokenVerifier`], so code that holds
//! one has proof that verification happened.
//!
//! # Verifiers
//!
//! * [`AllowAll`] - authentication disabled
//! * [`StaticTokenVerifier`] - a fixed set of shared tokens
//! * [`JwtVerifier`] - HS256 signed tokens with optional audience and issuer
//!
//! # Example Usage
//!
//! ```rust
//! use plan_server::auth::{Credential, StaticTokenVerifier, TokenVerifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = StaticTokenVerifier::new(["dev-token"]);
//!
//! let credential = Credential::from_authorization_header(Some("Bearer dev-token"))?;
//! let verified = verifier.verify(credential).await?;
//! assert_eq!(verified.caller().subject, "token-0");
//! # Ok(())
//! # }
//! ```

mod jwt;

pub use jwt::{Claims, JwtVerifier};

use crate::config::{AuthConfig, ConfigError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Type-level credential states
pub trait CredentialState: Send + Sync + 'static {}

/// Phantom type for a credential nobody has checked yet
#[derive(Debug, Clone, Copy)]
pub struct Unverified;
impl CredentialState for Unverified {}

/// Phantom type for a credential that passed a verifier
#[derive(Debug, Clone, Copy)]
pub struct Verified;
impl CredentialState for Verified {}

/// Bearer token with compile-time verification state
#[derive(Clone)]
pub struct Credential<S: CredentialState> {
    token: String,
    subject: String,
    _state: PhantomData<S>,
}

impl Credential<Unverified> {
    /// Wrap a raw bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: String::new(),
            _state: PhantomData,
        }
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// The scheme must be `Bearer` (case-insensitive) followed by a non-empty
    /// token.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, AuthError> {
        let header = header.ok_or(AuthError::MissingCredentials)?;
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedHeader);
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        Ok(Self::new(token))
    }

    /// The raw token (only available before verification)
    pub fn raw_value(&self) -> &str {
        &self.token
    }

    /// Mark as verified on behalf of `subject`. Only verifiers call this.
    pub(crate) fn into_verified(self, subject: impl Into<String>) -> Credential<Verified> {
        Credential {
            token: self.token,
            subject: subject.into(),
            _state: PhantomData,
        }
    }
}

impl Credential<Verified> {
    /// Identity established by verification
    pub fn caller(&self) -> CallerIdentity {
        CallerIdentity::new(self.subject.clone())
    }
}

impl<S: CredentialState> fmt::Debug for Credential<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

/// The authenticated caller, as placed into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredentials,
    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,
    #[error("Invalid credential provided")]
    InvalidCredential,
    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },
}

/// Checks bearer tokens.
pub trait TokenVerifier: Send + Sync {
    /// Verify a credential, consuming it.
    fn verify(
        &self,
        credential: Credential<Unverified>,
    ) -> impl Future<Output = Result<Credential<Verified>, AuthError>> + Send;

    /// Whether requests must carry a token at all.
    fn requires_credentials(&self) -> bool {
        true
    }
}

/// Accepts everything. Used when authentication is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl TokenVerifier for AllowAll {
    async fn verify(
        &self,
        credential: Credential<Unverified>,
    ) -> Result<Credential<Verified>, AuthError> {
        Ok(credential.into_verified("anonymous"))
    }

    fn requires_credentials(&self) -> bool {
        false
    }
}

/// Verifies against a fixed set of shared tokens.
///
/// Only SHA-256 digests of the configured tokens are kept, and every
/// comparison runs in constant time over all of them.
#[derive(Clone)]
pub struct StaticTokenVerifier {
    digests: Vec<[u8; 32]>,
}

impl StaticTokenVerifier {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            digests: tokens
                .into_iter()
                .map(|token| Self::digest(token.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    fn digest(token: &str) -> [u8; 32] {
        Sha256::digest(token.as_bytes()).into()
    }

    /// Index of the matching token, checked without early exit.
    fn find(&self, token: &str) -> Option<usize> {
        let presented = Self::digest(token);
        let mut found = None;
        for (index, digest) in self.digests.iter().enumerate() {
            if constant_time_eq(digest, &presented) && found.is_none() {
                found = Some(index);
            }
        }
        found
    }
}

impl fmt::Debug for StaticTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenVerifier")
            .field("tokens", &self.digests.len())
            .finish()
    }
}

impl TokenVerifier for StaticTokenVerifier {
    async fn verify(
        &self,
        credential: Credential<Unverified>,
    ) -> Result<Credential<Verified>, AuthError> {
        match self.find(credential.raw_value()) {
            Some(index) => Ok(credential.into_verified(format!("token-{}", index))),
            None => Err(AuthError::InvalidCredential),
        }
    }
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The verifier selected by configuration.
#[derive(Debug, Clone)]
pub enum Verifier {
    AllowAll(AllowAll),
    Static(StaticTokenVerifier),
    Jwt(JwtVerifier),
}

impl Verifier {
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        match config {
            AuthConfig::Disabled => Ok(Verifier::AllowAll(AllowAll)),
            AuthConfig::StaticTokens(tokens) => {
                if tokens.is_empty() || tokens.iter().any(|t| t.trim().is_empty()) {
                    return Err(ConfigError::InvalidAuth(
                        "static tokens must be non-empty".to_string(),
                    ));
                }
                Ok(Verifier::Static(StaticTokenVerifier::new(tokens)))
            }
            AuthConfig::Jwt {
                secret,
                audience,
                issuer,
            } => Ok(Verifier::Jwt(JwtVerifier::new(
                secret.clone(),
                audience.clone(),
                issuer.clone(),
            )?)),
        }
    }
}

impl TokenVerifier for Verifier {
    async fn verify(
        &self,
        credential: Credential<Unverified>,
    ) -> Result<Credential<Verified>, AuthError> {
        match self {
            Verifier::AllowAll(verifier) => verifier.verify(credential).await,
            Verifier::Static(verifier) => verifier.verify(credential).await,
            Verifier::Jwt(verifier) => verifier.verify(credential).await,
        }
    }

    fn requires_credentials(&self) -> bool {
        match self {
            Verifier::AllowAll(verifier) => verifier.requires_credentials(),
            Verifier::Static(verifier) => verifier.requires_credentials(),
            Verifier::Jwt(verifier) => verifier.requires_credentials(),
        }
    }
}
