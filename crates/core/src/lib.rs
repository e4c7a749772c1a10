//! `clipgate-core` — shared building blocks for the gateway.
//!
//! This crate holds pure primitives (identifiers, configuration). No HTTP, no
//! crypto.

pub mod config;
pub mod error;
pub mod id;

pub use config::{DeploymentMode, GatewayConfig};
pub use error::{ConfigError, ConfigResult};
pub use id::SubjectId;
