use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use clipgate_auth::VerificationError;

/// Every way the gateway can short-circuit a request.
///
/// The `Display` text is for logs only; callers see `public_message()`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no session cookie")]
    MissingCredential,

    #[error("session token rejected: {0}")]
    InvalidCredential(#[from] VerificationError),

    #[error("no authenticated identity at authorization stage")]
    AuthenticationRequired,

    #[error("role not permitted")]
    InsufficientRole,

    #[error("origin not allowed")]
    OriginNotAllowed,

    #[error("internal fault: {0}")]
    InternalFault(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredential | GatewayError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidCredential(_)
            | GatewayError::InsufficientRole
            | GatewayError::OriginNotAllowed => StatusCode::FORBIDDEN,
            GatewayError::InternalFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "login required",
            GatewayError::InvalidCredential(_) => "invalid token",
            GatewayError::AuthenticationRequired => "authentication required",
            GatewayError::InsufficientRole => "admin privileges required",
            GatewayError::OriginNotAllowed => "origin not allowed",
            GatewayError::InternalFault(_) => "server error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::InternalFault(detail) = &self {
            tracing::error!(%detail, "internal fault in gateway");
        }
        json_message(self.status(), self.public_message())
    }
}

/// `{"message": ...}` body with the given status.
pub fn json_message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}
