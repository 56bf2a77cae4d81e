use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub trusted_hops: usize,
    pub access_token_lifetime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub jti: String,
    /// Overrides the configured access token lifetime.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub jti: String,
    pub revoked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenStatus {
    pub jti: String,
    pub revoked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub principal: String,
    pub invalidated: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        trusted_hops: state.resolver.trusted_hops(),
        access_token_lifetime_secs: state.config.revocation.access_token_lifetime_secs,
    })
}

pub async fn revoke_token(
    State(state): State<AppState>,
    Json(body): Json<RevokeRequest>,
) -> (StatusCode, Json<RevokeResponse>) {
    let jti = body.jti.trim().to_string();
    if jti.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RevokeResponse { jti, revoked: false }),
        );
    }

    let revoked = state.ledger.revoke(&jti, body.ttl_secs.map(Duration::from_secs));
    // A write the store refused must not look like a stored revocation.
    let status = if revoked {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(RevokeResponse { jti, revoked }))
}

pub async fn get_token(
    State(state): State<AppState>,
    Path(jti): Path<String>,
) -> Json<TokenStatus> {
    let revoked = state.ledger.is_revoked(&jti);
    Json(TokenStatus { jti, revoked })
}

pub async fn invalidate_principal(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> (StatusCode, Json<InvalidateResponse>) {
    let invalidated = state.ledger.invalidate_all(&principal);
    let status = if invalidated {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(InvalidateResponse { principal, invalidated }))
}
