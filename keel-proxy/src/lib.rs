//! # KEEL Proxy
//!
//! Hosts a KEEL worker in front of a static site. Browsers talk to the proxy;
//! the active worker answers from its cache or the upstream origin.
//!
//! ## Endpoints
//!
//! - `GET /__keel/health` - Server and worker status
//! - `POST /__keel/message` - Post a client message (e.g. `{"type":"SKIP_WAITING"}`)
//! - `GET /__keel/caches` - Cache names and entry counts
//! - anything else - Proxied through the worker
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_proxy::{ProxyConfig, ProxyServer};
//!
//! let server = ProxyServer::start(ProxyConfig::new("https://example.com/")?).await?;
//! server.run(([127, 0, 0, 1], 3000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, ProxyConfig};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use keel_core::constants::USER_AGENT;
use keel_core::error::Result;

/// Largest request body forwarded upstream.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Caching proxy server.
pub struct ProxyServer {
    state: Arc<AppState>,
}

impl ProxyServer {
    /// Wraps prepared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Opens storage and installs a worker for `config.origin`.
    pub async fn start(config: ProxyConfig) -> Result<Self> {
        let state = AppState::new(config).await?;
        state.start_worker().await?;
        Ok(Self::new(Arc::new(state)))
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Creates the router with all layers configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::SERVER,
                HeaderValue::from_static(USER_AGENT),
            ))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server until Ctrl-C, then flushes persisted caches.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(origin = %self.state.config.origin, "KEEL proxy listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(err) = self.state.flush().await {
            warn!(error = %err, "Failed to flush caches on shutdown");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Starts a proxy configured from the environment.
pub async fn start_server(port: u16) -> Result<()> {
    let server = ProxyServer::start(ProxyConfig::from_env()?).await?;
    server.run(([0, 0, 0, 0], port)).await?;
    Ok(())
}
