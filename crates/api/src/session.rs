//! Session transport: the identity token rides in an HTTP-only cookie.
//!
//! The gateway only *reads* the cookie on the request path. Writing it is left
//! to the login flow (via [`SessionCookie::issue`]) and to logout.

use axum::http::header::{COOKIE, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use chrono::Duration;
use thiserror::Error;

use clipgate_auth::{Role, TokenCodec, TokenError};
use clipgate_core::{GatewayConfig, SubjectId};

/// Cookie attributes derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub max_age: Duration,
    /// Adds the `Secure` attribute (production only).
    pub secure: bool,
}

impl SessionSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            cookie_name: config.session_cookie_name.clone(),
            max_age: config.session_max_age,
            secure: config.is_production(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("cookie is not a valid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Builder for `Set-Cookie` values.
pub struct SessionCookie;

impl SessionCookie {
    /// Mint a fresh token and wrap it in a session cookie.
    pub fn issue(
        codec: &dyn TokenCodec,
        settings: &SessionSettings,
        subject_id: &SubjectId,
        role: Role,
    ) -> Result<HeaderValue, SessionError> {
        let token = codec.issue(subject_id, role)?;
        Self::with_token(settings, &token)
    }

    pub fn with_token(settings: &SessionSettings, token: &str) -> Result<HeaderValue, SessionError> {
        Ok(HeaderValue::from_str(&render(settings, token, settings.max_age.num_seconds()))?)
    }

    /// A cookie that makes the browser drop the session immediately.
    pub fn expired(settings: &SessionSettings) -> Result<HeaderValue, SessionError> {
        Ok(HeaderValue::from_str(&render(settings, "", 0))?)
    }
}

fn render(settings: &SessionSettings, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        settings.cookie_name, value, max_age_secs
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Find a cookie value across all `Cookie` headers.
///
/// Empty values are skipped, so a blank duplicate does not hide a later
/// real one; surrounding double quotes are stripped.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .find(|value| !value.is_empty())
}
