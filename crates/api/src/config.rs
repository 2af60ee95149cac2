use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Default login token TTL: one hour.
const DEFAULT_LOGIN_TOKEN_TTL_SECS: u64 = 3600;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT credential configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Base URL of the messaging-bot service's internal HTTP notifier.
    pub messenger_base_url: String,
    /// Shared secret for bot-originated calls (`X-Internal-Token`).
    pub internal_token: String,
    /// How long an unclaimed login token stays valid.
    pub login_token_ttl: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `3000`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                     |
    /// | `MESSENGER_HTTP_BASE`   | `http://telegram:8091`   |
    /// | `INTERNAL_TOKEN`        | (empty)                  |
    /// | `LOGIN_TOKEN_TTL_SECS`  | `3600`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let messenger_base_url = std::env::var("MESSENGER_HTTP_BASE")
            .unwrap_or_else(|_| "http://telegram:8091".into());

        let internal_token = std::env::var("INTERNAL_TOKEN").unwrap_or_default();

        let login_token_ttl_secs: u64 = std::env::var("LOGIN_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_LOGIN_TOKEN_TTL_SECS.to_string())
            .parse()
            .expect("LOGIN_TOKEN_TTL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            messenger_base_url,
            internal_token,
            login_token_ttl: Duration::from_secs(login_token_ttl_secs),
        }
    }
}
