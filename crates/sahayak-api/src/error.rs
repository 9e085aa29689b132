//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps jurisdiction and validation errors to HTTP status codes with a JSON
//! body. Internal error details are never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sahayak_jurisdiction::JurisdictionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The service lacks data needed to answer (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JurisdictionError> for AppError {
    fn from(err: JurisdictionError) -> Self {
        match &err {
            JurisdictionError::AlertNotFound(_) => Self::NotFound(err.to_string()),
            JurisdictionError::NoStations => Self::Unavailable(err.to_string()),
            JurisdictionError::InvalidSegmentation { .. }
            | JurisdictionError::InvalidRadius(_)
            | JurisdictionError::DuplicateStation(_) => Self::Validation(err.to_string()),
            JurisdictionError::Digest(_) => Self::BadRequest(err.to_string()),
            JurisdictionError::DatasetIo { .. } | JurisdictionError::DatasetFormat(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<sahayak_core::CoordinateError> for AppError {
    fn from(err: sahayak_core::CoordinateError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn not_found_status_code() {
        let (status, code) = AppError::NotFound("alert".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn no_stations_maps_to_503() {
        let err = AppError::from(JurisdictionError::NoStations);
        assert_eq!(err.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn bad_segmentation_maps_to_422() {
        let err = AppError::from(JurisdictionError::InvalidSegmentation {
            route_length: 1,
            nodes: 3,
        });
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn coordinate_errors_are_validation_errors() {
        let err = AppError::from(sahayak_core::CoordinateError::LatitudeOutOfRange(91.0));
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = AppError::Internal("dataset path /secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("secret"));
    }
}
