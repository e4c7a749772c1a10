//! Authorization stage: admit the attached identity only if its role is in
//! the guard's allowed set.
//!
//! Must run after [`crate::middleware::authenticate`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use clipgate_auth::{AuthzError, RequestIdentity, RoleSet, authorize};

use crate::app::errors::GatewayError;

pub async fn require_role(
    State(allowed): State<RoleSet>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(identity) = req.extensions().get::<RequestIdentity>() else {
        tracing::error!(
            path = %req.uri().path(),
            "role guard reached without an authenticated identity; authentication layer missing or misordered"
        );
        return Err(GatewayError::AuthenticationRequired);
    };

    match authorize(identity, &allowed) {
        Ok(()) => {}
        Err(AuthzError::InsufficientRole { role }) => {
            tracing::debug!(subject_id = %identity.subject_id, %role, %allowed, "role not permitted");
            return Err(GatewayError::InsufficientRole);
        }
        Err(err @ AuthzError::MalformedIdentity(_)) => {
            return Err(GatewayError::InternalFault(err.to_string()));
        }
    }

    Ok(next.run(req).await)
}
