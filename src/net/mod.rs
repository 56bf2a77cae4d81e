//! Client origin subsystem.
//!
//! # Data Flow
//! ```text
//! Request headers + socket peer
//!     → origin.rs (walk header chain, count trusted hops)
//!     → address.rs (private-range heuristic, format validation)
//!     → ClientOrigin (one validated address or 0.0.0.0)
//! ```
//!
//! # Design Decisions
//! - Trust is topological: a configured number of proxy hops, nothing signed
//! - The resolved origin is an identity hint, never an access decision
//! - Malformed input degrades to the sentinel instead of an error

pub mod address;
pub mod origin;

pub use address::{is_private_ip, is_valid_ip_format, UNKNOWN_ORIGIN};
pub use origin::{HeaderSource, OriginResolver, OriginSource, DEFAULT_ORIGIN_HEADERS};
