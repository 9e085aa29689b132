//! # sahayak-api — Receiver Service for the Trip Safety Engine
//!
//! HTTP front of the [`AlertConsole`](sahayak_jurisdiction::AlertConsole):
//! accepts emergency packets from rider devices, classifies their
//! signatures in the background, and resolves which police station is
//! responsible for a position.
//!
//! ## API Surface
//!
//! | Method | Path                              | Purpose                        |
//! |--------|-----------------------------------|--------------------------------|
//! | GET    | `/health`                         | Liveness                       |
//! | GET    | `/metrics`                        | Prometheus exposition          |
//! | POST   | `/v1/alerts`                      | Submit a `SignedPacket` (202)  |
//! | GET    | `/v1/alerts`, `/v1/alerts/{id}`   | Alert records                  |
//! | POST   | `/v1/events`                      | Any `TransportEvent`           |
//! | GET    | `/v1/stations`                    | Loaded station dataset         |
//! | POST   | `/v1/jurisdiction/resolve`        | Nearest station                |
//! | POST   | `/v1/routes/segments`             | Route segment owner            |
//! | POST   | `/v1/trips/{trip_id}/positions`   | Tracked position + hand-off    |
//! | PUT    | `/v1/trips/{trip_id}/segments`    | Route-progress policy for trip |
//! | DELETE | `/v1/trips/{trip_id}`             | Stop tracking                  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsLayer → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .merge(routes::alerts::router())
        .merge(routes::jurisdiction::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Prometheus text exposition, 404 when no recorder is installed.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
