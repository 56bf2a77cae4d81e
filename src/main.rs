//! request-trust service
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  REQUEST TRUST                    │
//!   Client Request     │  ┌───────────┐   ┌──────────────┐   ┌──────────┐ │
//!   ───────────────────┼─▶│ client_ip │──▶│ [auth layer] │──▶│revocation│─┼──▶ handlers
//!   (via N proxies)    │  │middleware │   │ CredentialCl.│   │middleware│ │
//!                      │  └─────┬─────┘   └──────────────┘   └────┬─────┘ │
//!                      │        ▼                                 ▼       │
//!                      │  ┌───────────┐                    ┌────────────┐ │
//!                      │  │  Origin   │                    │ Revocation │ │
//!                      │  │ Resolver  │                    │   Ledger   │ │
//!                      │  └───────────┘                    └─────┬──────┘ │
//!                      │                                         ▼        │
//!                      │                                  ┌────────────┐  │
//!                      │   admin API ────────────────────▶│ CacheStore │  │
//!                      │                                  └────────────┘  │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use request_trust::config::{load_config, TrustConfig};
use request_trust::observability::{logging, metrics};
use request_trust::{HttpServer, MemoryCache};

#[derive(Parser)]
#[command(name = "request-trust")]
#[command(about = "Client origin resolution and credential revocation service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrustConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("request-trust v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        trusted_hops = config.proxy.trusted_hops,
        header_chain = ?config.proxy.header_chain,
        access_token_lifetime_secs = config.revocation.access_token_lifetime_secs,
        "Configuration loaded"
    );
    if config.proxy.trusted_hops == 0 {
        tracing::warn!("No trusted proxy hops configured; forwarded-for is resolved heuristically");
    }

    if config.observability.metrics_enabled {
        metrics::init_metrics();
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Lazy eviction only covers keys that are read again; sweep the rest.
    let cache = MemoryCache::new();
    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper.purge_expired();
        }
    });

    let server = HttpServer::new(config, Arc::new(cache));
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
