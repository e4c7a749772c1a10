use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use clipgate_auth::RequestIdentity;

use crate::app::errors::GatewayError;

/// Extractor for the identity attached by the authentication stage.
///
/// Handlers behind the gateway take this instead of reading extensions by
/// hand. It rejects with 401 if the route was mounted without
/// authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIdentity(pub RequestIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(GatewayError::AuthenticationRequired)
    }
}
