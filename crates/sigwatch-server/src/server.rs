//! HTTP server implementation using axum.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use sigwatch_core::{Signal, SignalId, SignalPatch};
use sigwatch_hub::Hub;
use sigwatch_store::SqliteStore;
use sigwatch_telemetry::metrics::HANDSHAKE_REJECTS_TOTAL;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::ws;

/// Connection limiter to prevent too many concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Try to claim a connection slot. The slot is released when the
    /// returned guard drops.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub store: SqliteStore,
    pub limiter: Arc<ConnectionLimiter>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(hub: Arc<Hub>, store: SqliteStore, config: ServerConfig) -> Self {
        Self {
            hub,
            store,
            limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            config,
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/signals/{id}", get(get_signal).post(update_signal))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Current state document, exactly as pushed to subscribers.
async fn get_snapshot(State(state): State<AppState>) -> Result<Response, ApiError> {
    let doc = state.hub.current_document()?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        doc,
    )
        .into_response())
}

/// Read one signal's current state straight from the store.
async fn get_signal(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Signal>, ApiError> {
    state
        .store
        .fetch_one(SignalId(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Apply a partial update to one signal.
///
/// The change reaches subscribers via the hub's next poll cycle; this
/// endpoint never broadcasts directly.
async fn update_signal(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Signal>, ApiError> {
    let patch: SignalPatch =
        serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    patch.validate()?;

    state
        .store
        .update(SignalId(id), patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// WebSocket upgrade handler.
///
/// Plain GETs without an upgrade handshake are rejected with 426; a full
/// house gets 503. Everything else becomes a registered subscriber.
async fn ws_handler(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            HANDSHAKE_REJECTS_TOTAL.inc();
            debug!(reason = %rejection, "Non-upgrade request to streaming endpoint");
            return (
                StatusCode::UPGRADE_REQUIRED,
                "Expected a WebSocket connection.",
            )
                .into_response();
        }
    };

    let Some(guard) = state.limiter.try_acquire() else {
        warn!(
            current = state.limiter.current_count(),
            max = state.config.max_connections,
            "WebSocket connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    info!(
        connections = state.limiter.current_count(),
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| ws::handle_socket(socket, state, guard))
}

/// Run the HTTP server until the process is torn down.
pub async fn run_server(
    hub: Arc<Hub>,
    store: SqliteStore,
    config: ServerConfig,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(hub, store, config);
    let app = create_router(state);

    info!(%addr, "Starting signal hub server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
