//! Cross-origin policy: one configured origin, credentialed requests allowed.
//!
//! Two pieces run at the very front of the chain: `enforce_origin` turns away
//! foreign origins before authentication sees them, and the `CorsLayer`
//! answers preflights and decorates responses for the allowed origin.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use tower_http::cors::CorsLayer;

use clipgate_core::GatewayConfig;

use crate::app::errors::GatewayError;

pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(allowed_origin: &str) -> Result<Self, header::InvalidHeaderValue> {
        Ok(Self {
            allowed_origin: HeaderValue::from_str(allowed_origin)?,
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, header::InvalidHeaderValue> {
        Self::new(&config.allowed_origin)
    }

    pub fn allowed_origin(&self) -> &HeaderValue {
        &self.allowed_origin
    }

    /// Requests without an `Origin` header are same-origin or non-browser and
    /// pass; otherwise the origin must match byte for byte, the same rule
    /// the `CorsLayer` applies when echoing `Access-Control-Allow-Origin`.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        match headers.get(header::ORIGIN) {
            None => true,
            Some(origin) => *origin == self.allowed_origin,
        }
    }

    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.allowed_origin.clone())
            .allow_methods(ALLOWED_METHODS)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true)
    }
}

pub async fn enforce_origin(
    State(policy): State<CorsPolicy>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !policy.admits(req.headers()) {
        tracing::warn!(
            origin = ?req.headers().get(header::ORIGIN),
            method = %req.method(),
            path = %req.uri().path(),
            "cross-origin request from a foreign origin rejected"
        );
        return Err(GatewayError::OriginNotAllowed);
    }

    Ok(next.run(req).await)
}
