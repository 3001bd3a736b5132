//! # Relay Server
//!
//! HTTP + WebSocket front end of the scanner:
//!
//! | Route                   | Purpose                                        |
//! |-------------------------|------------------------------------------------|
//! | `GET /`                 | Liveness text                                  |
//! | `GET /ws`               | WebSocket upgrade; one [`run_session`] per client |
//! | `POST /analyze_product` | Product assessment via the completion service  |
//!
//! The relay owns connection lifecycle and serialization; all scanning
//! decisions are made by the [`ScanController`].
//!
//! HTTP routes answer any origin. The WebSocket upgrade is refused with 403
//! when the browser's `Origin` is not the configured `allowed_origin`.
//! Handshakes without an `Origin` header (non-browser clients) are accepted.

use anyhow::{Context, Result};
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::common::config::ServerInfo;

use super::analyze::analyze_product;
use super::completion::CompletionClient;
use super::controller::ScanController;
use super::session::run_session;

/// State shared by all handlers.
pub struct AppState {
    pub controller: Arc<ScanController>,
    pub completion: Arc<dyn CompletionClient>,
    pub allowed_origin: String,
}

/// The relay server: routes plus the address it listens on.
pub struct RelayServer {
    config: ServerInfo,
    state: Arc<AppState>,
}

impl RelayServer {
    /// Create a relay server.
    ///
    /// # Arguments
    /// - `config`: Listen address and the origin allowed to open scanning sessions
    /// - `controller`: Scan session controller shared by every connection
    /// - `completion`: Upstream used by `/analyze_product`
    pub fn new(
        config: ServerInfo,
        controller: Arc<ScanController>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        let state = Arc::new(AppState {
            controller,
            completion,
            allowed_origin: config.allowed_origin.clone(),
        });
        Self { config, state }
    }

    /// Build the axum router with all routes and a permissive CORS layer.
    pub fn router(&self) -> Result<Router> {
        Ok(Router::new()
            .route("/", get(home))
            .route("/ws", get(ws_handler))
            .route("/analyze_product", post(analyze_product))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone()))
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.address)
            .await
            .with_context(|| format!("failed to bind {}", self.config.address))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router()?;
        info!("🟢 Relay server running on {}", listener.local_addr()?);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Whether a WebSocket handshake carrying `headers` may open a session.
fn origin_allowed(allowed_origin: &str, headers: &HeaderMap) -> bool {
    if allowed_origin == "*" {
        return true;
    }
    match headers.get(ORIGIN) {
        Some(origin) => origin.as_bytes() == allowed_origin.as_bytes(),
        None => true,
    }
}

async fn home() -> &'static str {
    "relay server is running"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !origin_allowed(&state.allowed_origin, &headers) {
        warn!(
            "🚫 Rejected WebSocket upgrade from origin {:?}",
            headers.get(ORIGIN)
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    let controller = state.controller.clone();
    ws.on_upgrade(move |socket| run_session(socket, controller))
}
