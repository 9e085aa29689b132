//! # Jurisdiction API
//!
//! Stateless lookups (nearest station, segment owner) and per-trip position
//! streams that report hand-offs between stations.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use sahayak_core::{Coordinate, StationId, TripId};
use sahayak_jurisdiction::{
    Assignment, LocationReport, RouteSegments, SegmentAssignment, Station,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// A raw position.
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub lat: f64,
    pub lng: f64,
    /// Index along the trip's registered route, if known.
    #[serde(default)]
    pub route_index: Option<usize>,
}

impl Validate for PositionRequest {
    fn validate(&self) -> Result<(), String> {
        Coordinate::new(self.lat, self.lng)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl PositionRequest {
    fn coordinate(&self) -> Result<Coordinate, AppError> {
        Ok(Coordinate::new(self.lat, self.lng)?)
    }
}

/// A route partition among owning nodes.
#[derive(Debug, Deserialize)]
pub struct SegmentPlanRequest {
    pub route_length: usize,
    pub nodes: Vec<StationId>,
}

impl Validate for SegmentPlanRequest {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("nodes must not be empty".to_string());
        }
        if self.route_length < self.nodes.len() {
            return Err(format!(
                "route_length {} is shorter than the {} nodes",
                self.route_length,
                self.nodes.len()
            ));
        }
        Ok(())
    }
}

/// A one-off segment owner lookup.
#[derive(Debug, Deserialize)]
pub struct SegmentLookupRequest {
    #[serde(flatten)]
    pub plan: SegmentPlanRequest,
    pub index: usize,
}

impl Validate for SegmentLookupRequest {
    fn validate(&self) -> Result<(), String> {
        self.plan.validate()
    }
}

/// Build the jurisdiction router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/stations", get(list_stations))
        .route("/v1/jurisdiction/resolve", post(resolve))
        .route("/v1/routes/segments", post(segment_owner))
        .route("/v1/trips/{trip_id}/positions", post(track_position))
        .route("/v1/trips/{trip_id}/segments", put(register_segments))
        .route("/v1/trips/{trip_id}", delete(end_tracking))
}

/// GET /v1/stations — The loaded station dataset.
async fn list_stations(State(state): State<AppState>) -> Json<Vec<Station>> {
    Json(state.console.registry().stations().to_vec())
}

/// POST /v1/jurisdiction/resolve — Nearest station to a position.
async fn resolve(
    State(state): State<AppState>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<Json<Assignment>, AppError> {
    let req = extract_validated_json(body)?;
    Ok(Json(state.console.resolve(&req.coordinate()?)?))
}

/// POST /v1/routes/segments — Owner of a route index under an even partition.
async fn segment_owner(
    body: Result<Json<SegmentLookupRequest>, JsonRejection>,
) -> Result<Json<SegmentAssignment>, AppError> {
    let req = extract_validated_json(body)?;
    let segments = RouteSegments::partition(req.plan.route_length, req.plan.nodes)?;
    Ok(Json(segments.assign(req.index)))
}

/// POST /v1/trips/{trip_id}/positions — Assign a tracked position.
async fn track_position(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<Json<LocationReport>, AppError> {
    let req = extract_validated_json(body)?;
    let report = state
        .console
        .locate(TripId(trip_id), req.coordinate()?, req.route_index)?;
    Ok(Json(report))
}

/// PUT /v1/trips/{trip_id}/segments — Route-progress policy for a trip.
async fn register_segments(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    body: Result<Json<SegmentPlanRequest>, JsonRejection>,
) -> Result<Json<RouteSegments>, AppError> {
    let req = extract_validated_json(body)?;
    let segments = RouteSegments::partition(req.route_length, req.nodes)?;
    state.console.register_route(TripId(trip_id), segments.clone());
    Ok(Json(segments))
}

/// DELETE /v1/trips/{trip_id} — Stop tracking a trip.
async fn end_tracking(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let trip_id = TripId(trip_id);
    if state.console.end_tracking(&trip_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no tracked trip {trip_id}")))
    }
}
