//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, lifetimes > 0)
//! - Check the header chain is usable
//! - Check markers outlive the credentials they invalidate
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrustConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{parse_utc_offset, TrustConfig};
use crate::net::origin::PEER_SOURCE_NAME;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &TrustConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.proxy.header_chain.is_empty() {
        errors.push(ValidationError::new("proxy.header_chain", "must name at least one source"));
    }
    for (i, name) in config.proxy.header_chain.iter().enumerate() {
        let name = name.trim();
        if name.eq_ignore_ascii_case(PEER_SOURCE_NAME) {
            continue;
        }
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("proxy.header_chain[{i}]"),
                format!("{name:?} is not a valid header name"),
            ));
        }
    }

    let revocation = &config.revocation;
    if revocation.access_token_lifetime_secs == 0 {
        errors.push(ValidationError::new(
            "revocation.access_token_lifetime_secs",
            "must be greater than 0",
        ));
    }
    if revocation.principal_marker_ttl_secs <= revocation.access_token_lifetime_secs {
        errors.push(ValidationError::new(
            "revocation.principal_marker_ttl_secs",
            "must be longer than access_token_lifetime_secs",
        ));
    }
    if parse_utc_offset(&revocation.naive_utc_offset).is_none() {
        errors.push(ValidationError::new(
            "revocation.naive_utc_offset",
            format!("{:?} is not an offset like +07:00", revocation.naive_utc_offset),
        ));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
