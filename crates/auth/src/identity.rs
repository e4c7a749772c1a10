use serde::{Deserialize, Serialize};

use clipgate_core::SubjectId;

use crate::Role;

/// The resolved identity of a single in-flight request.
///
/// Produced by a successful token verification and attached to that request
/// only. It is never cached or shared between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub subject_id: SubjectId,
    pub role: Role,
}

impl RequestIdentity {
    pub fn new(subject_id: impl Into<SubjectId>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }
}
