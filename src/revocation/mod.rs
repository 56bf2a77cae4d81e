//! Credential revocation subsystem.
//!
//! # Data Flow
//! ```text
//! Logout / security event:
//!     → ledger.rs revoke(jti)              → cache: jwt_access_blacklist:<jti> = true
//! Password change / global logout:
//!     → ledger.rs invalidate_all(principal) → cache: user_tokens_invalid_after:<id> = now
//!
//! Every authenticated request (http::middleware::revocation):
//!     → is_revoked(jti)
//!     → issued_before_invalidation(principal, iat)   (issued.rs normalises both instants)
//!     → Active | Revoked | Invalidated
//! ```
//!
//! # Design Decisions
//! - Entries expire with the credential; nothing is ever deleted explicitly
//! - Markers are overwritten, last writer wins
//! - Checks fail open when the store is unreachable (see `RevocationLedger`)
//! - This layer does not authenticate; it is called by whoever does

pub mod issued;
pub mod ledger;

use thiserror::Error;

use crate::cache::CacheError;

pub use issued::IssuedAt;
pub use ledger::{CredentialStatus, RevocationLedger};

/// The parts of an authenticated credential the ledger needs.
///
/// An upstream authenticator inserts this into request extensions; the
/// revocation middleware reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialClaims {
    /// The `jti` claim.
    pub jti: String,
    /// Identity the credential was issued for.
    pub principal: String,
    /// The `iat` claim.
    pub issued_at: IssuedAt,
}

/// Internal failure while consulting the ledger. Never escapes the public API.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("invalid invalidation marker {0}")]
    InvalidMarker(String),

    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}
