//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver, ledger, middleware produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → /metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Credential identifiers are logged truncated, never in full
//! - Attacker-supplied strings are logged Debug-escaped
//! - Fail-open decisions are always logged at error and counted

pub mod logging;
pub mod metrics;
