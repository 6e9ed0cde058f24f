//! `FiscusServer` — Axum HTTP + WebSocket server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::{Json, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use fiscus_chat::ChatPipeline;
use fiscus_store::ConnectionPool;

use crate::config::ServerConfig;
use crate::errors::Result;
use crate::websocket::run_chat_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub pool: ConnectionPool,
    /// The conversational pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// HS256 validation secret.
    pub auth_secret: Arc<str>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Sessions currently open.
    pub active_sessions: Arc<AtomicUsize>,
    /// When the server started.
    pub start_time: Instant,
}

/// The main fiscus server.
pub struct FiscusServer {
    state: AppState,
}

/// GET /health response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while serving.
    pub status: String,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Open WebSocket sessions.
    pub active_sessions: usize,
}

#[derive(Debug, Deserialize)]
struct WsParams {
    token: Option<String>,
}

impl FiscusServer {
    /// Create a new server.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        pool: ConnectionPool,
        pipeline: Arc<ChatPipeline>,
        auth_secret: &str,
    ) -> Self {
        Self {
            state: AppState {
                pool,
                pipeline,
                auth_secret: Arc::from(auth_secret),
                config: Arc::new(config),
                active_sessions: Arc::new(AtomicUsize::new(0)),
                start_time: Instant::now(),
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ws/{conversation_id}", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Get the shared state (for tests and wiring).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind and serve until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "fiscus server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.active_sessions.load(Ordering::SeqCst),
    })
}

/// GET /ws/{conversation_id} — upgrade into a chat session.
async fn ws_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_chat_session(socket, conversation_id, params.token, state))
}
