//! Revocation middleware.
//! Rejects credentials the ledger no longer accepts.
//!
//! This is the attachment point for the authentication pipeline: whatever
//! verifies the bearer credential inserts [`CredentialClaims`] into the request
//! extensions, and this layer consults the ledger. Requests without claims are
//! not authenticated here and pass through.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::middleware::ClientOrigin;
use crate::http::server::AppState;
use crate::revocation::{CredentialClaims, CredentialStatus};

pub async fn revocation_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(claims) = req.extensions().get::<CredentialClaims>() else {
        return next.run(req).await;
    };

    match state.ledger.status(claims) {
        CredentialStatus::Active => next.run(req).await,
        status => {
            let origin = req
                .extensions()
                .get::<ClientOrigin>()
                .map(|o| o.as_str().to_string())
                .unwrap_or_default();
            tracing::warn!(
                principal = %claims.principal,
                status = ?status,
                origin = %origin,
                "Rejected revoked credential"
            );
            (StatusCode::UNAUTHORIZED, "Token has been revoked").into_response()
        }
    }
}
