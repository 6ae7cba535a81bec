//! sigwatch-server - HTTP/WebSocket surface of the signal hub.
//!
//! Routes:
//! - `GET /ws` — WebSocket upgrade; non-upgrade requests get 426
//! - `GET /api/snapshot` — current state document
//! - `GET /api/signals/{id}` — one signal
//! - `POST /api/signals/{id}` — partial update (`status`, `distance_cm`)
//! - `GET /healthz` — liveness probe
//!
//! Writes surface to subscribers only through the hub's next poll cycle;
//! there is no direct write-triggers-broadcast path.

pub mod config;
pub mod error;
pub mod server;
pub mod ws;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{create_router, run_server, AppState};
