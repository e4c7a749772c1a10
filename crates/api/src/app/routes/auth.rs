//! Session endpoints that sit beside the login flow.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{StatusCode, header::SET_COOKIE},
    response::Response,
    routing::post,
};

use clipgate_auth::RequestIdentity;

use crate::app::errors::{GatewayError, json_message};
use crate::context::CurrentIdentity;
use crate::session::{SessionCookie, SessionSettings};

/// Routes that need no session.
pub fn public_router(settings: Arc<SessionSettings>) -> Router {
    Router::new()
        .route("/auth/logout", post(logout))
        .layer(Extension(settings))
}

pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<RequestIdentity> {
    Json(identity)
}

pub async fn logout(Extension(settings): Extension<Arc<SessionSettings>>) -> Result<Response, GatewayError> {
    let cookie = SessionCookie::expired(&settings).map_err(|e| GatewayError::InternalFault(e.to_string()))?;

    let mut res = json_message(StatusCode::OK, "logged out");
    res.headers_mut().insert(SET_COOKIE, cookie);
    Ok(res)
}
