//! Request/response schema for the `/lugares` endpoints, and the mapping
//! from core errors to HTTP statuses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lugares_core::model::KNOWN_GROUPS;
use lugares_core::prelude::{NearbyPlace, PlacesError};

pub const MIN_NAME_CHARS: usize = 2;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddPlaceRequest {
    pub group: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct NearbyRequest {
    pub group: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub group: String,
    pub name: String,
    pub user_lat: f64,
    pub user_lon: f64,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub count: usize,
    pub places: Vec<NearbyPlace>,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub name: String,
    pub distance_km: f64,
}

// ============================================================================
// Errors
// ============================================================================

/// Boundary error: a status plus a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }
}

impl From<PlacesError> for ApiError {
    fn from(err: PlacesError) -> Self {
        let status = match &err {
            PlacesError::InvalidCoordinate { .. } | PlacesError::UnknownGroup(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PlacesError::NotFound(_) => StatusCode::NOT_FOUND,
            PlacesError::StoreUnavailable(_) | PlacesError::MalformedResult(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let detail = match &err {
            PlacesError::UnknownGroup(name) => format!(
                "unknown group '{name}', expected one of: {}",
                KNOWN_GROUPS.join(", ")
            ),
            _ => err.to_string(),
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}
