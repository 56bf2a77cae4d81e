//! Request trust resolution and credential revocation.
//!
//! Two independent request-time checks: which client a request really came
//! from behind a known number of proxies ([`net`]), and whether the bearer
//! credential it carries has been revoked ([`revocation`]).

pub mod admin;
pub mod cache;
pub mod clock;
pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod revocation;

pub use cache::{CacheStore, MemoryCache};
pub use config::TrustConfig;
pub use http::HttpServer;
pub use net::OriginResolver;
pub use revocation::{CredentialClaims, CredentialStatus, IssuedAt, RevocationLedger};
