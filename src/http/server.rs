//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, client origin, revocation)
//! - Merge the admin API when enabled
//! - Bind server to listener with connect info for peer addresses

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::cache::CacheStore;
use crate::config::TrustConfig;
use crate::http::middleware::{client_ip_middleware, revocation_middleware, ClientOrigin};
use crate::net::OriginResolver;
use crate::observability::metrics;
use crate::revocation::RevocationLedger;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TrustConfig>,
    pub resolver: Arc<OriginResolver>,
    pub ledger: Arc<RevocationLedger>,
}

impl AppState {
    /// Build the resolver and ledger from configuration around `cache`.
    pub fn new(config: TrustConfig, cache: Arc<dyn CacheStore>) -> Self {
        let resolver = OriginResolver::new(&config.proxy.header_chain, config.proxy.trusted_hops);
        let ledger = RevocationLedger::new(cache, &config.revocation);
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            ledger: Arc::new(ledger),
        }
    }
}

/// HTTP server exposing the origin and revocation services.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: TrustConfig, cache: Arc<dyn CacheStore>) -> Self {
        let state = AppState::new(config, cache);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let mut router = Router::new()
            .route("/whoami", get(whoami))
            .route("/metrics", get(metrics_handler))
            .with_state(state.clone());

        if state.config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .layer(middleware::from_fn_with_state(state.clone(), revocation_middleware))
            .layer(middleware::from_fn_with_state(state.clone(), client_ip_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(state.config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            trusted_hops = self.state.resolver.trusted_hops(),
            admin_enabled = self.state.config.admin.enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

#[derive(Serialize)]
struct WhoAmI {
    origin: String,
    trusted_hops: usize,
}

async fn whoami(
    State(state): State<AppState>,
    Extension(origin): Extension<ClientOrigin>,
) -> Json<WhoAmI> {
    Json(WhoAmI {
        origin: origin.0,
        trusted_hops: state.resolver.trusted_hops(),
    })
}

async fn metrics_handler() -> Response {
    match metrics::render_metrics() {
        Some(body) => body.into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics disabled").into_response(),
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
