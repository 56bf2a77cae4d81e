//! Expiring key-value store consumed by the revocation ledger.
//!
//! # Data Flow
//! ```text
//! RevocationLedger
//!     → CacheStore::set(key, value, ttl)   (revoke, invalidate_all)
//!     → CacheStore::get(key)               (is_revoked, issued_before_invalidation)
//!     → memory.rs (in-process DashMap store) or any networked implementation
//! ```
//!
//! # Design Decisions
//! - Only `set` and `get` are part of the contract; entries leave by expiry
//! - Independent keys need no cross-key transaction
//! - Store errors are returned, never swallowed; the ledger decides the policy

pub mod memory;

use std::time::Duration;

use thiserror::Error;

pub use memory::MemoryCache;

/// A value held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Flag(bool),
    Text(String),
}

/// Failure reported by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Expiring key-value store shared by every request handler.
///
/// Implementations must be safe to call concurrently on independent keys and
/// must bound every call by their own timeout.
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> CacheResult<()>;

    /// Fetch the live value under `key`, if any.
    fn get(&self, key: &str) -> CacheResult<Option<CacheValue>>;
}
