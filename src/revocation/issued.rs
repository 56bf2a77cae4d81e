//! Normalisation of credential issuance times and marker timestamps.
//!
//! Both sides of the "issued before invalidation" comparison are turned into
//! offset-aware instants first. Naive values are localised with the configured
//! offset, never assumed to be UTC silently.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::revocation::LedgerError;

/// Layout of offset-less timestamps accepted from older marker writers.
const NAIVE_MARKER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// When a credential was issued, as presented by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IssuedAt {
    /// Whole seconds since the Unix epoch (the JWT `iat` claim).
    Seconds(i64),
    /// Fractional seconds since the Unix epoch.
    FractionalSeconds(f64),
    /// An instant with a known offset.
    Aware(DateTime<FixedOffset>),
    /// A wall-clock time with no offset attached.
    Naive(NaiveDateTime),
}

impl IssuedAt {
    /// Resolve to an aware instant, localising naive values with `naive_offset`.
    pub fn to_instant(&self, naive_offset: FixedOffset) -> Result<DateTime<FixedOffset>, LedgerError> {
        match *self {
            IssuedAt::Seconds(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.fixed_offset())
                .ok_or_else(|| LedgerError::OutOfRange(format!("epoch seconds {secs}"))),
            IssuedAt::FractionalSeconds(secs) => from_fractional(secs),
            IssuedAt::Aware(dt) => Ok(dt),
            IssuedAt::Naive(naive) => localize(naive, naive_offset),
        }
    }
}

impl From<i64> for IssuedAt {
    fn from(secs: i64) -> Self {
        IssuedAt::Seconds(secs)
    }
}

impl From<f64> for IssuedAt {
    fn from(secs: f64) -> Self {
        IssuedAt::FractionalSeconds(secs)
    }
}

impl From<DateTime<Utc>> for IssuedAt {
    fn from(dt: DateTime<Utc>) -> Self {
        IssuedAt::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for IssuedAt {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        IssuedAt::Aware(dt)
    }
}

impl From<NaiveDateTime> for IssuedAt {
    fn from(naive: NaiveDateTime) -> Self {
        IssuedAt::Naive(naive)
    }
}

fn from_fractional(secs: f64) -> Result<DateTime<FixedOffset>, LedgerError> {
    if !secs.is_finite() {
        return Err(LedgerError::OutOfRange(format!("epoch seconds {secs}")));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    // `as` saturates, so anything beyond i64 is caught by from_timestamp below.
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| LedgerError::OutOfRange(format!("epoch seconds {secs}")))
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Result<DateTime<FixedOffset>, LedgerError> {
    naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| LedgerError::OutOfRange(format!("local time {naive}")))
}

/// Render the instant stored in a principal marker.
pub fn format_marker(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a stored marker. RFC 3339 is what this crate writes; offset-less
/// ISO 8601 is accepted and localised with `naive_offset`.
pub fn parse_marker(raw: &str, naive_offset: FixedOffset) -> Result<DateTime<FixedOffset>, LedgerError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_MARKER_FORMAT)
        .map_err(|e| LedgerError::InvalidMarker(format!("{raw:?}: {e}")))?;
    localize(naive, naive_offset)
}
