//! Request middleware.
//!
//! # Order
//! ```text
//! client_ip.rs   → ClientOrigin extension
//! [authenticator, owned by the embedding service] → CredentialClaims extension
//! revocation.rs  → 401 for revoked or invalidated credentials
//! ```

pub mod client_ip;
pub mod revocation;

pub use client_ip::{client_ip_middleware, ClientOrigin};
pub use revocation::revocation_middleware;
