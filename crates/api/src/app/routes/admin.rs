//! Admin-tier routes. Every route here is mounted behind
//! `require_role(RoleSet::admin_tier())`; admin services merge their own
//! routers in via `build_app_with`.

use axum::{Json, Router, routing::get};
use serde_json::json;

use crate::context::CurrentIdentity;

pub fn router() -> Router {
    Router::new().route("/session", get(session))
}

pub async fn session(CurrentIdentity(identity): CurrentIdentity) -> Json<serde_json::Value> {
    Json(json!({
        "subject_id": identity.subject_id,
        "role": identity.role,
    }))
}
