//! Client origin middleware.
//! Resolves the originating address once per request and attaches it.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Validated client address attached to every request.
///
/// An identity hint for rate limiting and audit logs; never an access decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

impl ClientOrigin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub async fn client_ip_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let origin = state.resolver.resolve_validated(req.headers(), peer.as_deref());
    tracing::debug!(origin = %origin, path = %req.uri().path(), "Client origin");

    req.extensions_mut().insert(ClientOrigin(origin));
    next.run(req).await
}
