use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clipgate_core::SubjectId;

use crate::{RequestIdentity, Role, VerificationError};

/// Identity token claims.
///
/// Wire names follow the registered JWT claims (`sub`, `iat`, `exp`); the
/// timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject identifier.
    pub sub: SubjectId,

    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaims {
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            subject_id: self.sub.clone(),
            role: self.role,
        }
    }
}

/// Deterministically validate the claim time window.
///
/// A token is valid only strictly before `expires_at`. A window that closes
/// before it opens can never have been valid and is reported as expired.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::TokenCodec`].
pub fn validate_claims(claims: &IdentityClaims, now: DateTime<Utc>) -> Result<(), VerificationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(VerificationError::Expired);
    }
    if now >= claims.expires_at {
        return Err(VerificationError::Expired);
    }
    Ok(())
}
