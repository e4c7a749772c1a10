//! Authentication stage: session cookie → verified `RequestIdentity`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use clipgate_auth::TokenCodec;

use crate::app::errors::GatewayError;
use crate::session::read_cookie;

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<dyn TokenCodec>,
    pub cookie_name: Arc<str>,
}

impl AuthState {
    pub fn new(codec: Arc<dyn TokenCodec>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Missing cookie → 401 without touching the codec; any verification failure
/// → 403; otherwise the identity is attached to this request's extensions.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(token) = read_cookie(req.headers(), &state.cookie_name) else {
        tracing::debug!(path = %req.uri().path(), "no session cookie");
        return Err(GatewayError::MissingCredential);
    };

    let identity = state.codec.verify(token).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), error = %e, "session token rejected");
        GatewayError::InvalidCredential(e)
    })?;

    tracing::debug!(subject_id = %identity.subject_id, role = %identity.role, "request authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
