//! `clipgate-auth` — pure authentication/authorization boundary.
//!
//! Token issuance/verification and role checks live here. This crate is
//! intentionally decoupled from HTTP: the API crate owns cookies, headers and
//! status codes.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod identity;
pub mod roles;

pub use authorize::{AuthzError, RoleSet, authorize};
pub use claims::{IdentityClaims, validate_claims};
pub use codec::{Hs256TokenCodec, TokenCodec, TokenError, VerificationError};
pub use identity::RequestIdentity;
pub use roles::{Role, UnknownRole};
