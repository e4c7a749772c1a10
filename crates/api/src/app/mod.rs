//! HTTP application wiring (Axum router + gateway pipeline).
//!
//! Request order, outermost first:
//! panic guard → trace → origin gate → CORS → authenticate → require_role →
//! handler. The last two are attached per route group by [`Gateway`].

use std::{any::Any, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use clipgate_auth::{Hs256TokenCodec, RoleSet, TokenCodec};
use clipgate_core::GatewayConfig;

use crate::authz;
use crate::cors::{self, CorsPolicy};
use crate::middleware::{self, AuthState};
use crate::session::SessionSettings;

pub mod errors;
pub mod routes;

use errors::GatewayError;

/// Composable guards for route groups.
///
/// Holds only the shared, read-only codec; cloning is cheap.
#[derive(Clone)]
pub struct Gateway {
    auth: AuthState,
}

impl Gateway {
    pub fn new(codec: Arc<dyn TokenCodec>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            auth: AuthState::new(codec, cookie_name),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(Hs256TokenCodec::from_config(config)),
            config.session_cookie_name.as_str(),
        )
    }

    pub fn codec(&self) -> &Arc<dyn TokenCodec> {
        &self.auth.codec
    }

    /// Every route in `router` requires a valid session.
    pub fn authenticated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(from_fn_with_state(self.auth.clone(), middleware::authenticate))
    }

    /// Every route in `router` requires a valid session whose role is in
    /// `allowed`.
    pub fn require_role<S>(&self, router: Router<S>, allowed: RoleSet) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Added first, so it runs after authentication.
        let guarded = router.route_layer(from_fn_with_state(allowed, authz::require_role));
        self.authenticated(guarded)
    }

    pub fn admin_tier<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.require_role(router, RoleSet::admin_tier())
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &GatewayConfig) -> anyhow::Result<Router> {
    build_app_with(config, Router::new(), Router::new())
}

/// Build the router with downstream services mounted behind the gateway.
///
/// `members` routes need any valid session; `admin` routes are nested under
/// `/admin` and need the admin tier.
pub fn build_app_with(config: &GatewayConfig, members: Router, admin: Router) -> anyhow::Result<Router> {
    let gateway = Gateway::from_config(config);
    let cors_policy = CorsPolicy::from_config(config).context("CORS_ORIGIN is not a valid header value")?;
    let session = Arc::new(SessionSettings::from_config(config));

    let authenticated = gateway.authenticated(
        Router::new()
            .route("/auth/me", get(routes::auth::me))
            .merge(members),
    );
    let admin = gateway.admin_tier(routes::admin::router().merge(admin));

    tracing::info!(
        allowed_origin = %config.allowed_origin,
        secure_cookie = session.secure,
        session_max_age_secs = session.max_age.num_seconds(),
        "gateway configured"
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::auth::public_router(session))
        .merge(authenticated)
        .nest("/admin", admin)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(cors_policy.clone(), cors::enforce_origin))
                .layer(cors_policy.layer()),
        ))
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    GatewayError::InternalFault(format!("panic while serving request: {detail}")).into_response()
}
