//! Denylist of revoked credentials and per-principal invalidation markers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use crate::cache::{CacheStore, CacheValue};
use crate::clock::{Clock, SystemClock};
use crate::config::RevocationConfig;
use crate::observability::metrics;
use crate::revocation::issued::{format_marker, parse_marker, IssuedAt};
use crate::revocation::{CredentialClaims, LedgerError};

/// Key prefix of individually revoked credentials.
pub const REVOKED_KEY_PREFIX: &str = "jwt_access_blacklist:";

/// Key prefix of principal invalidation markers.
pub const MARKER_KEY_PREFIX: &str = "user_tokens_invalid_after:";

/// Outcome of checking a credential against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Active,
    /// Individually revoked by `jti`.
    Revoked,
    /// Issued before the principal's latest invalidation.
    Invalidated,
}

impl CredentialStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, CredentialStatus::Active)
    }
}

/// Revocation state backed by a shared expiring store.
///
/// Every method returns a plain `bool`; no error or panic escapes.
///
/// # Fail-open
/// When the store cannot be read, [`RevocationLedger::is_revoked`] and
/// [`RevocationLedger::issued_before_invalidation`] answer `false`. An
/// unreachable cache must not lock every user out, so for the duration of an
/// outage revoked credentials are accepted until they expire. Writes report
/// failure instead, so callers never mistake a lost revocation for a stored one.
pub struct RevocationLedger {
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    marker_ttl: Duration,
    naive_offset: FixedOffset,
}

impl RevocationLedger {
    pub fn new(cache: Arc<dyn CacheStore>, config: &RevocationConfig) -> Self {
        Self {
            cache,
            clock: Arc::new(SystemClock),
            default_ttl: Duration::from_secs(config.access_token_lifetime_secs),
            marker_ttl: Duration::from_secs(config.principal_marker_ttl_secs),
            naive_offset: config.naive_offset(),
        }
    }

    /// Read time from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deny `jti` for `ttl`, or for the configured credential lifetime.
    ///
    /// Returns false for an empty identifier or when the store refused the write.
    pub fn revoke(&self, jti: &str, ttl: Option<Duration>) -> bool {
        if jti.is_empty() {
            return false;
        }
        let ttl = ttl.unwrap_or(self.default_ttl);

        match self.cache.set(&revoked_key(jti), CacheValue::Flag(true), ttl) {
            Ok(()) => {
                tracing::info!(jti = %jti_prefix(jti), ttl_secs = ttl.as_secs(), "Access token revoked");
                metrics::record_revocation("stored");
                true
            }
            Err(e) => {
                tracing::error!(jti = %jti_prefix(jti), error = %e, "Failed to revoke access token");
                metrics::record_cache_error("revoke");
                metrics::record_revocation("failed");
                false
            }
        }
    }

    /// Deny `jti` until the credential's own expiry.
    ///
    /// A credential that has already expired needs no entry; that counts as success.
    pub fn revoke_until(&self, jti: &str, expires_at: DateTime<Utc>) -> bool {
        if jti.is_empty() {
            return false;
        }
        match (expires_at - self.clock.now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => self.revoke(jti, Some(remaining)),
            _ => {
                tracing::debug!(jti = %jti_prefix(jti), "Credential already expired, nothing to revoke");
                metrics::record_revocation("expired");
                true
            }
        }
    }

    /// Whether `jti` is on the denylist. Fails open on store errors.
    pub fn is_revoked(&self, jti: &str) -> bool {
        if jti.is_empty() {
            return false;
        }

        match self.cache.get(&revoked_key(jti)) {
            Ok(value) => {
                let revoked = value == Some(CacheValue::Flag(true));
                metrics::record_revocation_check(if revoked { "revoked" } else { "active" });
                revoked
            }
            Err(e) => {
                tracing::error!(
                    jti = %jti_prefix(jti),
                    error = %e,
                    "Failed to check access token denylist, treating as not revoked"
                );
                metrics::record_cache_error("is_revoked");
                metrics::record_revocation_check("fail_open");
                false
            }
        }
    }

    /// Invalidate every credential of `principal` issued before now.
    ///
    /// Overwrites any earlier marker.
    pub fn invalidate_all(&self, principal: &str) -> bool {
        if principal.is_empty() {
            return false;
        }
        let marker = format_marker(self.clock.now());

        match self.cache.set(&marker_key(principal), CacheValue::Text(marker.clone()), self.marker_ttl) {
            Ok(()) => {
                tracing::info!(principal = %principal, invalid_before = %marker, "All tokens invalidated for principal");
                metrics::record_principal_invalidation("stored");
                true
            }
            Err(e) => {
                tracing::error!(principal = %principal, error = %e, "Failed to invalidate principal tokens");
                metrics::record_cache_error("invalidate_all");
                metrics::record_principal_invalidation("failed");
                false
            }
        }
    }

    /// Whether a credential issued at `issued_at` predates the principal's marker.
    ///
    /// False when there is no marker, and false (fail open) on any store or
    /// parsing error.
    pub fn issued_before_invalidation(&self, principal: &str, issued_at: impl Into<IssuedAt>) -> bool {
        if principal.is_empty() {
            return false;
        }
        let issued_at = issued_at.into();

        match self.check_marker(principal, issued_at) {
            Ok(invalid) => invalid,
            Err(e) => {
                tracing::error!(principal = %principal, error = %e, "Failed to check token invalidation");
                if matches!(e, LedgerError::Cache(_)) {
                    metrics::record_cache_error("issued_before_invalidation");
                }
                metrics::record_revocation_check("fail_open");
                false
            }
        }
    }

    /// Combined check used by the request pipeline.
    pub fn status(&self, claims: &CredentialClaims) -> CredentialStatus {
        if self.is_revoked(&claims.jti) {
            CredentialStatus::Revoked
        } else if self.issued_before_invalidation(&claims.principal, claims.issued_at) {
            CredentialStatus::Invalidated
        } else {
            CredentialStatus::Active
        }
    }

    fn check_marker(&self, principal: &str, issued_at: IssuedAt) -> Result<bool, LedgerError> {
        let marker = match self.cache.get(&marker_key(principal))? {
            None => return Ok(false),
            Some(CacheValue::Text(raw)) if raw.is_empty() => return Ok(false),
            Some(CacheValue::Text(raw)) => parse_marker(&raw, self.naive_offset)?,
            Some(CacheValue::Flag(_)) => {
                return Err(LedgerError::InvalidMarker("expected a timestamp, found a flag".into()))
            }
        };
        let issued = issued_at.to_instant(self.naive_offset)?;
        Ok(issued < marker)
    }
}

fn revoked_key(jti: &str) -> String {
    format!("{REVOKED_KEY_PREFIX}{jti}")
}

fn marker_key(principal: &str) -> String {
    format!("{MARKER_KEY_PREFIX}{principal}")
}

/// Enough of the identifier to correlate logs without writing it out.
fn jti_prefix(jti: &str) -> String {
    let prefix: String = jti.chars().take(8).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, CacheResult, MemoryCache};
    use crate::clock::ManualClock;
    use chrono::{NaiveDate, TimeDelta};

    struct UnreachableCache;

    impl CacheStore for UnreachableCache {
        fn set(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        fn get(&self, _key: &str) -> CacheResult<Option<CacheValue>> {
            Err(CacheError::Timeout(Duration::from_millis(250)))
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_225_600, 0).unwrap()
    }

    fn setup() -> (RevocationLedger, Arc<ManualClock>, MemoryCache) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = MemoryCache::with_clock(clock.clone());
        let ledger = RevocationLedger::new(Arc::new(cache.clone()), &RevocationConfig::default())
            .with_clock(clock.clone());
        (ledger, clock, cache)
    }

    #[test]
    fn test_revoke_then_check() {
        let (ledger, _, _) = setup();
        assert!(!ledger.is_revoked("abc123"));
        assert!(ledger.revoke("abc123", None));
        assert!(ledger.is_revoked("abc123"));
        assert!(!ledger.is_revoked("other"));
    }

    #[test]
    fn test_revocation_expires_with_ttl() {
        let (ledger, clock, _) = setup();
        assert!(ledger.revoke("abc123", Some(Duration::from_secs(60))));

        clock.advance(Duration::from_secs(59));
        assert!(ledger.is_revoked("abc123"));

        clock.advance(Duration::from_secs(1));
        assert!(!ledger.is_revoked("abc123"));
    }

    #[test]
    fn test_default_ttl_is_access_lifetime() {
        let (ledger, clock, _) = setup();
        assert!(ledger.revoke("abc123", None));

        clock.advance(Duration::from_secs(1799));
        assert!(ledger.is_revoked("abc123"));
        clock.advance(Duration::from_secs(1));
        assert!(!ledger.is_revoked("abc123"));
    }

    #[test]
    fn test_empty_identifiers_are_rejected() {
        let (ledger, _, cache) = setup();
        assert!(!ledger.revoke("", None));
        assert!(!ledger.is_revoked(""));
        assert!(!ledger.invalidate_all(""));
        assert!(!ledger.issued_before_invalidation("", 0_i64));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_only_flag_true_counts_as_revoked() {
        let (ledger, _, cache) = setup();
        cache
            .set(&revoked_key("a"), CacheValue::Flag(false), Duration::from_secs(60))
            .unwrap();
        cache
            .set(&revoked_key("b"), CacheValue::Text("true".into()), Duration::from_secs(60))
            .unwrap();
        assert!(!ledger.is_revoked("a"));
        assert!(!ledger.is_revoked("b"));
    }

    #[test]
    fn test_revoke_until_uses_remaining_lifetime() {
        let (ledger, clock, cache) = setup();
        let expires = start() + TimeDelta::seconds(120);
        assert!(ledger.revoke_until("abc123", expires));

        clock.advance(Duration::from_secs(119));
        assert!(ledger.is_revoked("abc123"));
        clock.advance(Duration::from_secs(1));
        assert!(!ledger.is_revoked("abc123"));

        // Already expired: nothing written
        cache.purge_expired();
        assert!(ledger.revoke_until("stale", start()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_all_splits_on_marker() {
        let (ledger, clock, _) = setup();
        let before = start() - TimeDelta::seconds(1);

        assert!(!ledger.issued_before_invalidation("42", before));
        assert!(ledger.invalidate_all("42"));
        assert!(ledger.issued_before_invalidation("42", before));

        clock.advance(Duration::from_secs(1));
        let after = clock.now();
        assert!(!ledger.issued_before_invalidation("42", after));
        // Other principals are unaffected
        assert!(!ledger.issued_before_invalidation("43", before));
    }

    #[test]
    fn test_issued_at_equal_to_marker_is_valid() {
        let (ledger, _, _) = setup();
        assert!(ledger.invalidate_all("42"));
        assert!(!ledger.issued_before_invalidation("42", start()));
        assert!(!ledger.issued_before_invalidation("42", start().timestamp()));
    }

    #[test]
    fn test_later_invalidation_overwrites() {
        let (ledger, clock, _) = setup();
        assert!(ledger.invalidate_all("42"));

        clock.advance(Duration::from_secs(300));
        let issued_between = clock.now();
        assert!(!ledger.issued_before_invalidation("42", issued_between));

        clock.advance(Duration::from_secs(300));
        assert!(ledger.invalidate_all("42"));
        assert!(ledger.issued_before_invalidation("42", issued_between));
    }

    #[test]
    fn test_marker_expires_after_retention() {
        let (ledger, clock, _) = setup();
        assert!(ledger.invalidate_all("42"));
        let issued = start() - TimeDelta::seconds(10);

        clock.advance(Duration::from_secs(7 * 86_400 - 1));
        assert!(ledger.issued_before_invalidation("42", issued));
        clock.advance(Duration::from_secs(1));
        assert!(!ledger.issued_before_invalidation("42", issued));
    }

    #[test]
    fn test_issued_at_forms_are_normalised() {
        let (ledger, _, _) = setup();
        assert!(ledger.invalidate_all("42"));

        // Epoch seconds and fractional seconds
        assert!(ledger.issued_before_invalidation("42", start().timestamp() - 1));
        assert!(ledger.issued_before_invalidation("42", start().timestamp() as f64 - 0.5));
        assert!(!ledger.issued_before_invalidation("42", start().timestamp() as f64 + 0.5));

        // An aware instant at +07:00 one minute before the marker
        let plus_seven = FixedOffset::east_opt(7 * 3600).unwrap();
        let aware = (start() - TimeDelta::minutes(1)).with_timezone(&plus_seven);
        assert!(ledger.issued_before_invalidation("42", aware));

        // Naive values are read as UTC under the default config
        let naive = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(23, 59, 0).unwrap();
        assert!(ledger.issued_before_invalidation("42", naive));
        let naive = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 1, 0).unwrap();
        assert!(!ledger.issued_before_invalidation("42", naive));
    }

    #[test]
    fn test_naive_offset_from_config() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = MemoryCache::with_clock(clock.clone());
        let config = RevocationConfig {
            naive_utc_offset: "+07:00".into(),
            ..RevocationConfig::default()
        };
        let ledger = RevocationLedger::new(Arc::new(cache), &config).with_clock(clock);
        assert!(ledger.invalidate_all("42"));

        // 06:59 at +07:00 is 23:59 UTC the previous day, before the marker
        let naive = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(6, 59, 0).unwrap();
        assert!(ledger.issued_before_invalidation("42", naive));
        let naive = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(7, 1, 0).unwrap();
        assert!(!ledger.issued_before_invalidation("42", naive));
    }

    #[test]
    fn test_corrupt_marker_fails_open() {
        let (ledger, _, cache) = setup();
        let ttl = Duration::from_secs(60);
        cache.set(&marker_key("1"), CacheValue::Text("not a date".into()), ttl).unwrap();
        cache.set(&marker_key("2"), CacheValue::Flag(true), ttl).unwrap();
        cache.set(&marker_key("3"), CacheValue::Text(String::new()), ttl).unwrap();

        for principal in ["1", "2", "3"] {
            assert!(!ledger.issued_before_invalidation(principal, 0_i64));
        }
        assert!(!ledger.issued_before_invalidation("4", f64::NAN));
    }

    #[test]
    fn test_unreachable_store_fails_open_on_reads() {
        let ledger = RevocationLedger::new(Arc::new(UnreachableCache), &RevocationConfig::default());
        // Known risk: a revoked credential is accepted while the store is down.
        assert!(!ledger.is_revoked("abc123"));
        assert!(!ledger.issued_before_invalidation("42", 0_i64));
    }

    #[test]
    fn test_unreachable_store_reports_failed_writes() {
        let ledger = RevocationLedger::new(Arc::new(UnreachableCache), &RevocationConfig::default());
        assert!(!ledger.revoke("abc123", None));
        assert!(!ledger.invalidate_all("42"));
    }

    #[test]
    fn test_status_precedence() {
        let (ledger, clock, _) = setup();
        let claims = CredentialClaims {
            jti: "abc123".into(),
            principal: "42".into(),
            issued_at: IssuedAt::from(start() - TimeDelta::seconds(5)),
        };
        assert_eq!(ledger.status(&claims), CredentialStatus::Active);

        assert!(ledger.invalidate_all("42"));
        assert_eq!(ledger.status(&claims), CredentialStatus::Invalidated);

        assert!(ledger.revoke("abc123", None));
        assert_eq!(ledger.status(&claims), CredentialStatus::Revoked);

        clock.advance(Duration::from_secs(10));
        let fresh = CredentialClaims {
            jti: "def456".into(),
            issued_at: IssuedAt::from(clock.now()),
            ..claims
        };
        assert!(ledger.status(&fresh).is_active());
    }

    #[test]
    fn test_jti_prefix_does_not_split_chars() {
        assert_eq!(jti_prefix("0123456789abcdef"), "01234567...");
        assert_eq!(jti_prefix("ééééééééé"), "éééééééé...");
    }
}
