//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use request_trust::cache::{CacheError, CacheResult, CacheStore, CacheValue, MemoryCache};
use request_trust::clock::ManualClock;
use request_trust::config::TrustConfig;
use request_trust::http::{AppState, HttpServer};
use request_trust::{CredentialClaims, IssuedAt, RevocationLedger};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A store whose backend is down.
#[allow(dead_code)]
pub struct UnreachableCache;

impl CacheStore for UnreachableCache {
    fn set(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn get(&self, _key: &str) -> CacheResult<Option<CacheValue>> {
        Err(CacheError::Timeout(Duration::from_millis(100)))
    }
}

#[allow(dead_code)]
pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap()
}

/// Config with the admin API on and the given trust depth.
#[allow(dead_code)]
pub fn test_config(trusted_hops: usize) -> TrustConfig {
    let mut config = TrustConfig::default();
    config.proxy.trusted_hops = trusted_hops;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// State over a memory store driven by a manual clock.
#[allow(dead_code)]
pub fn manual_state(config: TrustConfig) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::with_clock(clock.clone()));
    let mut state = AppState::new(config, cache.clone());
    state.ledger = Arc::new(
        RevocationLedger::new(cache, &state.config.revocation).with_clock(clock.clone()),
    );
    (state, clock)
}

/// Attach a socket peer the way `into_make_service_with_connect_info` does.
#[allow(dead_code)]
pub fn with_peer(mut req: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

#[allow(dead_code)]
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

/// Claims carried in `x-test-*` headers, if all three are present and valid.
#[allow(dead_code)]
pub fn claims_from_headers(headers: &HeaderMap) -> Option<CredentialClaims> {
    let header = |name: &str| headers.get(name)?.to_str().ok().map(str::to_string);
    let iat = header("x-test-iat")?.parse::<i64>().ok()?;
    Some(CredentialClaims {
        jti: header("x-test-jti")?,
        principal: header("x-test-principal")?,
        issued_at: IssuedAt::Seconds(iat),
    })
}

/// Stand-in authenticator: turns `x-test-*` headers into [`CredentialClaims`].
///
/// Sits outermost, where a real verifier would run before the revocation layer.
/// No borrow of `req` may live across the `.await`, or the future stops being `Send`.
#[allow(dead_code)]
pub async fn fake_authenticator(mut req: Request<Body>, next: Next) -> Response {
    if let Some(claims) = claims_from_headers(req.headers()) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}

/// Full router behind the stand-in authenticator.
#[allow(dead_code)]
pub fn test_app(state: AppState) -> Router {
    HttpServer::build_router(state).layer(middleware::from_fn(fake_authenticator))
}

/// A request presenting a credential through the stand-in authenticator.
#[allow(dead_code)]
pub fn authed_request(jti: &str, principal: &str, iat: i64) -> Request<Body> {
    Request::builder()
        .uri("/whoami")
        .header("x-test-jti", jti)
        .header("x-test-principal", principal)
        .header("x-test-iat", iat.to_string())
        .body(Body::empty())
        .unwrap()
}
