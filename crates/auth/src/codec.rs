//! Identity token codec (HS256-signed JWT).

use chrono::{DateTime, Duration, DurationRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use clipgate_core::{GatewayConfig, SubjectId};

use crate::{IdentityClaims, RequestIdentity, Role, validate_claims};

/// Why a presented token was not accepted.
///
/// Tampered payloads, foreign secrets and structurally broken tokens are all
/// reported as `InvalidSignature`.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

/// Token issuance failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("cannot issue a token for an empty subject")]
    EmptySubject,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Signs and verifies identity tokens.
///
/// Implementations hold only read-only key material and can be shared across
/// requests behind an `Arc`.
pub trait TokenCodec: Send + Sync {
    /// Lifetime of freshly issued tokens.
    fn ttl(&self) -> Duration;

    fn issue_at(&self, subject_id: &SubjectId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError>;

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<RequestIdentity, VerificationError>;

    fn issue(&self, subject_id: &SubjectId, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject_id, role, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<RequestIdentity, VerificationError> {
        self.verify_at(token, Utc::now())
    }
}

/// HMAC-SHA256 codec keyed by a single server-held secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.session_max_age)
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn issue_at(&self, subject_id: &SubjectId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        if subject_id.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        // Claims travel as whole seconds.
        let issued_at = now
            .duration_trunc(Duration::seconds(1))
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding(format!("lifetime {} overflows the clock", self.ttl)))?;

        let claims = IdentityClaims {
            sub: subject_id.clone(),
            role,
            issued_at,
            expires_at,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<RequestIdentity, VerificationError> {
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = ?e.kind(), "token rejected by decoder");
            VerificationError::InvalidSignature
        })?;

        validate_claims(&data.claims, now)?;

        Ok(data.claims.identity())
    }
}
