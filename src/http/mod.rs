//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address via ConnectInfo)
//!     → server.rs (Axum setup, TraceLayer, TimeoutLayer)
//!     → middleware/client_ip.rs (ClientOrigin)
//!     → middleware/revocation.rs (reject revoked CredentialClaims)
//!     → handlers (/whoami, /metrics, /admin/*)
//! ```

pub mod middleware;
pub mod server;

pub use middleware::ClientOrigin;
pub use server::{AppState, HttpServer};
