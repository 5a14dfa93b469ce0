//! Plan server
//!
//! Serves the plan resource over HTTP from an in-memory store.
//!
//! Usage:
//!   plan-server --auth-token dev-token
//!   plan-server --jwt-secret "$SECRET" --jwt-audience plan-api --bind 0.0.0.0:3001
//!   plan-server --no-auth --log-level debug
//!
//! Every flag can also be set through its `PLAN_SERVER_*` environment variable.

use clap::Parser;
use env_logger::Env;
use log::info;
use plan_server::config::{AuthConfig, ConfigError, ServerConfig};
use plan_server::server;
use plan_server::storage::InMemoryStorage;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "plan-server")]
#[command(about = "Plan resource service with ETag-based optimistic concurrency")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PLAN_SERVER_BIND", default_value = "127.0.0.1:3001")]
    bind: SocketAddr,

    /// Prefix of every store key
    #[arg(long, env = "PLAN_SERVER_KEY_PREFIX", default_value = "plan")]
    key_prefix: String,

    /// Deadline for each store call, in milliseconds
    #[arg(long, env = "PLAN_SERVER_STORE_TIMEOUT_MS", default_value_t = 5000)]
    store_timeout_ms: u64,

    /// Accepted bearer token (repeatable)
    #[arg(long = "auth-token", env = "PLAN_SERVER_AUTH_TOKENS", value_delimiter = ',')]
    auth_tokens: Vec<String>,

    /// HS256 secret for bearer JWTs
    #[arg(long, env = "PLAN_SERVER_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Required `aud` claim
    #[arg(long, env = "PLAN_SERVER_JWT_AUDIENCE", requires = "jwt_secret")]
    jwt_audience: Option<String>,

    /// Required `iss` claim
    #[arg(long, env = "PLAN_SERVER_JWT_ISSUER", requires = "jwt_secret")]
    jwt_issuer: Option<String>,

    /// Accept requests without a bearer token
    #[arg(long, env = "PLAN_SERVER_NO_AUTH")]
    no_auth: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "PLAN_SERVER_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let has_tokens = !self.auth_tokens.is_empty();

        match (self.no_auth, has_tokens, &self.jwt_secret) {
            (true, false, None) => Ok(AuthConfig::Disabled),
            (true, _, _) => Err(ConfigError::Conflict(
                "--no-auth cannot be combined with --auth-token or --jwt-secret".to_string(),
            )),
            (false, true, Some(_)) => Err(ConfigError::Conflict(
                "use either --auth-token or --jwt-secret, not both".to_string(),
            )),
            (false, true, None) => Ok(AuthConfig::StaticTokens(self.auth_tokens.clone())),
            (false, false, Some(secret)) => Ok(AuthConfig::Jwt {
                secret: secret.clone(),
                audience: self.jwt_audience.clone(),
                issuer: self.jwt_issuer.clone(),
            }),
            (false, false, None) => Err(ConfigError::InvalidAuth(
                "no authentication configured; pass --auth-token, --jwt-secret or --no-auth"
                    .to_string(),
            )),
        }
    }

    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let auth = self.auth_config()?;
        ServerConfig::builder()
            .with_bind_addr(self.bind)
            .with_key_prefix(self.key_prefix)
            .with_store_timeout(Duration::from_millis(self.store_timeout_ms))
            .with_auth(auth)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    info!("Plan server starting...");
    let config = args.into_config()?;

    server::serve(config, InMemoryStorage::new()).await?;
    Ok(())
}
