//! Server configuration.
//!
//! [`ServerConfig`] holds everything the composition root needs: where to
//! listen, how to key plans in the store, how long a store call may take, and
//! how to authenticate callers. Build it with [`ServerConfigBuilder`], which
//! validates before handing out a config.
//!
//! ```rust
//! use plan_server::config::{AuthConfig, ServerConfig};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder()
//!     .with_bind_addr("0.0.0.0:8080".parse()?)
//!     .with_store_timeout(Duration::from_millis(500))
//!     .with_auth(AuthConfig::StaticTokens(vec!["dev-token".to_string()]))
//!     .build()?;
//! assert_eq!(config.key_prefix, "plan");
//! # Ok(())
//! # }
//! ```

use crate::providers::{DEFAULT_KEY_PREFIX, DEFAULT_STORE_TIMEOUT};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Port the service has always listened on.
pub const DEFAULT_PORT: u16 = 3001;

/// How bearer tokens are verified.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthConfig {
    /// No authentication; every request is accepted
    #[default]
    Disabled,
    /// A fixed set of shared tokens
    StaticTokens(Vec<String>),
    /// HS256 JWTs signed with `secret`
    Jwt {
        secret: String,
        audience: Option<String>,
        issuer: Option<String>,
    },
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Disabled => write!(f, "Disabled"),
            AuthConfig::StaticTokens(tokens) => write!(f, "StaticTokens({} token(s))", tokens.len()),
            AuthConfig::Jwt {
                audience, issuer, ..
            } => f
                .debug_struct("Jwt")
                .field("audience", audience)
                .field("issuer", issuer)
                .finish_non_exhaustive(),
        }
    }
}

/// Configuration for a plan server instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Prefix of every store key (`<prefix>_<objectId>`)
    pub key_prefix: String,
    /// Deadline for each store call
    pub store_timeout: Duration,
    /// Bearer-token verification
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            auth: AuthConfig::Disabled,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty()
            || !self
                .key_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::InvalidKeyPrefix(self.key_prefix.clone()));
        }

        if self.store_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        match &self.auth {
            AuthConfig::Disabled => {}
            AuthConfig::StaticTokens(tokens) => {
                if tokens.is_empty() || tokens.iter().any(|t| t.trim().is_empty()) {
                    return Err(ConfigError::InvalidAuth(
                        "static tokens must be non-empty".to_string(),
                    ));
                }
            }
            AuthConfig::Jwt { secret, .. } => {
                if secret.is_empty() {
                    return Err(ConfigError::InvalidAuth(
                        "JWT secret must not be empty".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Start from the defaults: `127.0.0.1:3001`, prefix `plan`, 5s store
    /// timeout, authentication disabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.config.bind_addr = bind_addr;
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.config.key_prefix = key_prefix.into();
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.config.store_timeout = store_timeout;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors, reported at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid key prefix '{0}': use ASCII letters, digits and '-'")]
    InvalidKeyPrefix(String),

    #[error("Store timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Invalid authentication settings: {0}")]
    InvalidAuth(String),

    #[error("Conflicting options: {0}")]
    Conflict(String),

    #[error("Failed to load plan schema: {0}")]
    Schema(String),
}
