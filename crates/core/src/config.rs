//! Process-wide gateway configuration.
//!
//! Loaded once at startup and passed explicitly to the token codec, session
//! transport and cross-origin policy. Nothing reads the environment after
//! `GatewayConfig::from_env` returns.

use chrono::Duration;

use crate::error::{ConfigError, ConfigResult};

pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_SESSION_MAX_AGE_SECS: &str = "SESSION_MAX_AGE_SECS";
pub const ENV_SESSION_COOKIE_NAME: &str = "SESSION_COOKIE_NAME";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8081";
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 60 * 60;
/// Upper bound on the session lifetime (400 days, the browser cap on cookie age).
pub const MAX_SESSION_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "authToken";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Deployment flavour. Only `Production` turns on the `Secure` cookie flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }

    fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            DeploymentMode::Production
        } else {
            DeploymentMode::Development
        }
    }
}

/// Immutable gateway configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// HMAC secret used to sign and verify identity tokens.
    pub jwt_secret: String,

    /// The single origin allowed to make (credentialed) cross-origin calls.
    pub allowed_origin: String,

    pub mode: DeploymentMode,

    /// Session lifetime: cookie `Max-Age` and token time-to-live.
    pub session_max_age: Duration,

    pub session_cookie_name: String,

    pub bind_addr: String,
}

impl GatewayConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to documented defaults; set-but-invalid keys are
    /// errors.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup(ENV_JWT_SECRET) {
            Some(secret) if secret.is_empty() => return Err(ConfigError::Empty(ENV_JWT_SECRET)),
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let allowed_origin = match lookup(ENV_CORS_ORIGIN) {
            Some(origin) => validate_origin(origin.trim())?,
            None => DEFAULT_ALLOWED_ORIGIN.to_string(),
        };

        let mode = lookup(ENV_APP_ENV)
            .map(|v| DeploymentMode::from_env_value(&v))
            .unwrap_or_default();

        let session_max_age = match lookup(ENV_SESSION_MAX_AGE_SECS) {
            Some(raw) => parse_max_age(&raw)?,
            None => Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS),
        };

        let session_cookie_name = match lookup(ENV_SESSION_COOKIE_NAME) {
            Some(name) => validate_cookie_name(name.trim())?,
            None => DEFAULT_SESSION_COOKIE_NAME.to_string(),
        };

        let bind_addr = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            jwt_secret,
            allowed_origin,
            mode,
            session_max_age,
            session_cookie_name,
            bind_addr,
        })
    }

    /// Development defaults with an explicit secret (handy for tests).
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            mode: DeploymentMode::Development,
            session_max_age: Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS),
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode.is_production()
    }
}

// Never print the signing secret.
impl core::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("jwt_secret", &"<redacted>")
            .field("allowed_origin", &self.allowed_origin)
            .field("mode", &self.mode)
            .field("session_max_age", &self.session_max_age)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

fn validate_origin(origin: &str) -> ConfigResult<String> {
    if origin.is_empty() {
        return Err(ConfigError::Empty(ENV_CORS_ORIGIN));
    }
    let Some((scheme, host)) = origin.split_once("://") else {
        return Err(ConfigError::invalid(ENV_CORS_ORIGIN, "expected scheme://host[:port]"));
    };
    if scheme.is_empty() || host.is_empty() || host.contains('/') {
        return Err(ConfigError::invalid(ENV_CORS_ORIGIN, "expected scheme://host[:port]"));
    }
    Ok(origin.to_string())
}

fn parse_max_age(raw: &str) -> ConfigResult<Duration> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|e: core::num::ParseIntError| ConfigError::invalid(ENV_SESSION_MAX_AGE_SECS, e.to_string()))?;
    if secs <= 0 {
        return Err(ConfigError::invalid(ENV_SESSION_MAX_AGE_SECS, "must be positive"));
    }
    if secs > MAX_SESSION_MAX_AGE_SECS {
        return Err(ConfigError::invalid(
            ENV_SESSION_MAX_AGE_SECS,
            format!("must not exceed {MAX_SESSION_MAX_AGE_SECS}"),
        ));
    }
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::invalid(ENV_SESSION_MAX_AGE_SECS, "out of range"))
}

fn validate_cookie_name(name: &str) -> ConfigResult<String> {
    if name.is_empty() {
        return Err(ConfigError::Empty(ENV_SESSION_COOKIE_NAME));
    }
    let forbidden = |c: char| c.is_ascii_control() || c.is_whitespace() || "()<>@,;:\\\"/[]?={}".contains(c);
    if name.chars().any(forbidden) || !name.is_ascii() {
        return Err(ConfigError::invalid(ENV_SESSION_COOKIE_NAME, "not a valid cookie name"));
    }
    Ok(name.to_string())
}
