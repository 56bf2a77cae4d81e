//! Metrics collection and exposition.
//!
//! # Metrics
//! - `origin_resolutions_total` (counter): resolved origins by winning source
//! - `origin_rejected_total` (counter): origins replaced by the sentinel
//! - `credential_revocations_total` (counter): revoke calls by outcome
//! - `revocation_checks_total` (counter): denylist/marker checks by result,
//!   `fail_open` counts checks answered without the store
//! - `principal_invalidations_total` (counter): invalidate_all by outcome
//! - `revocation_cache_errors_total` (counter): store errors by operation
//! - `revocation_cache_entries` (gauge): entries held by the in-process store
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so library users and
//!   tests pay nothing
//! - Labels are static strings, except the origin `source` label, which is a
//!   header name from the configured chain; cardinality stays bounded by config

use std::sync::OnceLock;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    pub const ORIGIN_RESOLUTIONS_TOTAL: &str = "origin_resolutions_total";
    pub const ORIGIN_REJECTED_TOTAL: &str = "origin_rejected_total";
    pub const CREDENTIAL_REVOCATIONS_TOTAL: &str = "credential_revocations_total";
    pub const REVOCATION_CHECKS_TOTAL: &str = "revocation_checks_total";
    pub const PRINCIPAL_INVALIDATIONS_TOTAL: &str = "principal_invalidations_total";
    pub const CACHE_ERRORS_TOTAL: &str = "revocation_cache_errors_total";
    pub const CACHE_ENTRIES: &str = "revocation_cache_entries";
}

/// Install the Prometheus recorder.
///
/// Returns `true` if initialization succeeded, `false` if already initialized
/// or another recorder is installed.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }
            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format, if the recorder is installed.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

pub fn record_origin_resolved(source: &str) {
    counter!(names::ORIGIN_RESOLUTIONS_TOTAL, "source" => source.to_string()).increment(1);
}

pub fn record_origin_rejected() {
    counter!(names::ORIGIN_REJECTED_TOTAL).increment(1);
}

pub fn record_revocation(outcome: &'static str) {
    counter!(names::CREDENTIAL_REVOCATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_revocation_check(result: &'static str) {
    counter!(names::REVOCATION_CHECKS_TOTAL, "result" => result).increment(1);
}

pub fn record_principal_invalidation(outcome: &'static str) {
    counter!(names::PRINCIPAL_INVALIDATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_cache_error(op: &'static str) {
    counter!(names::CACHE_ERRORS_TOTAL, "op" => op).increment(1);
}

pub fn record_cache_entries(count: usize) {
    gauge!(names::CACHE_ENTRIES).set(count as f64);
}
