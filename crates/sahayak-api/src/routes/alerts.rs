//! # Alert Intake API
//!
//! Emergency packets are accepted with `202 Accepted`: the alert is stored
//! and returned with its current classification (usually `pending`) while
//! the signature check continues in the background. A signature that is not
//! even valid hex is still recorded, classified `invalid`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use sahayak_core::{AlertId, TransportEvent, WirePacket};
use sahayak_jurisdiction::{AlertRecord, Ingested, JurisdictionError, Submission};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/alerts", post(submit_alert).get(list_alerts))
        .route("/v1/alerts/{id}", get(get_alert))
        .route("/v1/events", post(ingest_event))
}

/// POST /v1/alerts — Record an emergency packet.
async fn submit_alert(
    State(state): State<AppState>,
    body: Result<Json<WirePacket>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let packet = extract_json(body)?;
    let submission = state.console.submit_wire(packet)?;
    Ok((StatusCode::ACCEPTED, Json(submission)))
}

/// GET /v1/alerts — All alerts in arrival order.
async fn list_alerts(State(state): State<AppState>) -> Json<Vec<AlertRecord>> {
    Json(state.console.alerts())
}

/// GET /v1/alerts/{id} — One alert.
async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertRecord>, AppError> {
    let alert_id = AlertId(id);
    state
        .console
        .alert(&alert_id)
        .map(Json)
        .ok_or_else(|| JurisdictionError::AlertNotFound(alert_id).into())
}

/// POST /v1/events — Any transport event from the rider link.
async fn ingest_event(
    State(state): State<AppState>,
    body: Result<Json<TransportEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<Ingested>), AppError> {
    let event = extract_json(body)?;
    let ingested = state.console.ingest(event)?;
    let status = match ingested {
        Ingested::Alert(_) => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(ingested)))
}
