//! HTTP gateway: cookie session transport, authentication and role guards,
//! cross-origin policy, and the router that ties them together.

pub mod app;
pub mod authz;
pub mod context;
pub mod cors;
pub mod middleware;
pub mod session;

pub use app::errors::GatewayError;
pub use app::{Gateway, build_app, build_app_with};
pub use context::CurrentIdentity;
