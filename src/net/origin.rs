//! Proxy-aware client origin resolution.
//!
//! # Responsibilities
//! - Walk the configured header chain in priority order
//! - Count back past trusted proxy hops in forwarded-for chains
//! - Fall back to the leftmost public address when no hop count is configured
//! - Validate the result before it reaches rate limiting or audit logs
//!
//! # Design Decisions
//! - Trust depth is explicit; forwarded-for is attacker-controlled up to the
//!   operator's own edge, so nothing left of the trusted hops is believed
//! - The private-address heuristic only applies when no depth is configured and
//!   is not a security boundary
//! - Resolution never fails: the worst case is `0.0.0.0`

use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::net::address::{is_private_ip, is_valid_ip_format, UNKNOWN_ORIGIN};
use crate::observability::metrics;

/// Header names searched when none are configured, highest priority first.
pub const DEFAULT_ORIGIN_HEADERS: [&str; 6] = [
    "x-forwarded-for",
    "x-real-ip",
    "cf-connecting-ip",
    "true-client-ip",
    "x-client-ip",
    PEER_SOURCE_NAME,
];

/// Pseudo header name that stands for the socket peer address.
pub const PEER_SOURCE_NAME: &str = "remote-addr";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// One entry of the header chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginSource {
    /// Comma separated, client first, one address appended per proxy hop.
    ForwardedChain(String),
    /// A header carrying a single address.
    Header(String),
    /// The remote peer of the connection.
    Peer,
}

impl OriginSource {
    /// Classify a configured header name. Names are matched case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            FORWARDED_FOR => OriginSource::ForwardedChain(name),
            PEER_SOURCE_NAME => OriginSource::Peer,
            _ => OriginSource::Header(name),
        }
    }

    /// Label used for logs and metrics.
    pub fn label(&self) -> &str {
        match self {
            OriginSource::ForwardedChain(name) | OriginSource::Header(name) => name,
            OriginSource::Peer => PEER_SOURCE_NAME,
        }
    }
}

/// Read access to request headers by lowercase name.
pub trait HeaderSource {
    /// The value of `name`, if present. Repeated headers are joined with `", "`.
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl HeaderSource for HeaderMap {
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>> {
        let mut values = self.get_all(name).iter().filter_map(|v| v.to_str().ok());
        let first = values.next()?;
        match values.next() {
            None => Some(Cow::Borrowed(first)),
            Some(second) => {
                let mut joined = format!("{first}, {second}");
                for value in values {
                    joined.push_str(", ");
                    joined.push_str(value);
                }
                Some(Cow::Owned(joined))
            }
        }
    }
}

/// Keys are matched exactly first, then ASCII case-insensitively.
impl HeaderSource for HashMap<String, String> {
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(|v| Cow::Borrowed(v.as_str()))
    }
}

/// Resolves the originating client address of a request.
#[derive(Debug, Clone)]
pub struct OriginResolver {
    chain: Vec<OriginSource>,
    trusted_hops: usize,
}

impl Default for OriginResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN_HEADERS, 0)
    }
}

impl OriginResolver {
    /// Build a resolver from header names in priority order and the number of
    /// trusted proxy hops in front of this service.
    pub fn new<I, S>(header_chain: I, trusted_hops: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            chain: header_chain
                .into_iter()
                .map(|name| OriginSource::from_name(name.as_ref()))
                .collect(),
            trusted_hops,
        }
    }

    pub fn trusted_hops(&self) -> usize {
        self.trusted_hops
    }

    pub fn chain(&self) -> &[OriginSource] {
        &self.chain
    }

    /// Best estimate of the client address.
    ///
    /// Falls back to `peer`, then to `0.0.0.0`. The result is not validated;
    /// see [`OriginResolver::resolve_validated`].
    pub fn resolve<H>(&self, headers: &H, peer: Option<&str>) -> String
    where
        H: HeaderSource + ?Sized,
    {
        for source in &self.chain {
            let candidate = match source {
                OriginSource::ForwardedChain(name) => headers
                    .header_value(name)
                    .and_then(|raw| self.pick_from_chain(&raw)),
                OriginSource::Header(name) => headers
                    .header_value(name)
                    .and_then(|raw| non_empty(raw.trim())),
                OriginSource::Peer => peer.and_then(|p| non_empty(p.trim())),
            };

            if let Some(origin) = candidate {
                tracing::trace!(source = source.label(), origin = ?origin, "Origin resolved");
                metrics::record_origin_resolved(source.label());
                return origin;
            }
        }

        match peer.and_then(|p| non_empty(p.trim())) {
            Some(origin) => {
                metrics::record_origin_resolved(PEER_SOURCE_NAME);
                origin
            }
            None => {
                metrics::record_origin_resolved("none");
                UNKNOWN_ORIGIN.to_string()
            }
        }
    }

    /// Like [`OriginResolver::resolve`] but only returns syntactically valid
    /// addresses; anything else becomes `0.0.0.0`.
    pub fn resolve_validated<H>(&self, headers: &H, peer: Option<&str>) -> String
    where
        H: HeaderSource + ?Sized,
    {
        let origin = self.resolve(headers, peer);
        if is_valid_ip_format(&origin) {
            return origin;
        }

        // Debug formatting escapes control characters so the value cannot forge log lines.
        tracing::warn!(origin = ?origin, "Invalid IP format detected");
        metrics::record_origin_rejected();
        UNKNOWN_ORIGIN.to_string()
    }

    fn pick_from_chain(&self, raw: &str) -> Option<String> {
        let hops: Vec<&str> = raw.split(',').map(str::trim).collect();
        let n = self.trusted_hops;

        let picked = if n > 0 && hops.len() > n {
            // Rightmost n entries were appended by our own proxies.
            hops[hops.len().saturating_sub(n + 1)]
        } else {
            hops.iter()
                .copied()
                .find(|ip| !is_private_ip(ip))
                .unwrap_or(hops[0])
        };

        non_empty(picked)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
