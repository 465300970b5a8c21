//! HTTP routing for the places service.
//!
//! Propagation policy per endpoint: `agregar` hard-fails on store errors,
//! `cercanos` soft-fails to an empty list, `distancia` distinguishes 404
//! from 500, `todos` absorbs per-group failures and only 500s when the
//! whole store is unreachable.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use lugares_core::prelude::*;

use crate::api::{
    AddPlaceRequest, ApiError, DistanceRequest, DistanceResponse, MIN_NAME_CHARS,
    MessageResponse, NearbyRequest, NearbyResponse,
};

pub type SharedStore = Arc<dyn GeoIndex>;

pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/redis-ping", get(store_ping))
        .route("/lugares/agregar", post(add_place))
        .route("/lugares/cercanos", post(nearby))
        .route("/lugares/distancia", post(distance))
        .route("/lugares/todos", get(all_places))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(store)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "active" }))
}

async fn store_ping(State(store): State<SharedStore>) -> Json<serde_json::Value> {
    let ok = match store.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "store ping failed");
            false
        }
    };
    Json(json!({ "store_ok": ok }))
}

async fn add_place(
    State(store): State<SharedStore>,
    Json(req): Json<AddPlaceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let group = Group::new(&req.group)?;
    if req.name.chars().count() < MIN_NAME_CHARS {
        return Err(ApiError::unprocessable(format!(
            "name must be at least {MIN_NAME_CHARS} characters"
        )));
    }
    if is_reserved_name(&req.name) {
        return Err(ApiError::unprocessable(
            "name uses a reserved prefix".to_string(),
        ));
    }
    let coord = Coordinate::new(req.lat, req.lon)?;

    store.geo_add(&group, &req.name, coord).await.map_err(|err| {
        error!(%group, name = %req.name, %err, "add place failed");
        ApiError::from(err)
    })?;

    info!(%group, name = %req.name, "place stored");
    Ok(Json(MessageResponse {
        message: "place stored".into(),
    }))
}

async fn nearby(
    State(store): State<SharedStore>,
    Json(req): Json<NearbyRequest>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let group = Group::new(&req.group)?;
    let center = Coordinate::new(req.lat, req.lon)?;

    let places = match find_nearby(store.as_ref(), &group, center, None).await {
        Ok(places) => places,
        Err(err) => {
            // Degraded but available: answer with an empty list rather
            // than an error.
            warn!(%group, %err, "radius search failed");
            Vec::new()
        }
    };

    Ok(Json(NearbyResponse {
        count: places.len(),
        places,
    }))
}

async fn distance(
    State(store): State<SharedStore>,
    Json(req): Json<DistanceRequest>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let group = Group::new(&req.group)?;
    let user = Coordinate::new(req.user_lat, req.user_lon)?;

    let distance_km = place_distance(store.as_ref(), &group, &req.name, user)
        .await
        .map_err(|err| {
            error!(%group, name = %req.name, %err, "distance computation failed");
            ApiError::from(err)
        })?
        .ok_or_else(|| ApiError::from(PlacesError::NotFound(req.name.clone())))?;

    Ok(Json(DistanceResponse {
        name: req.name,
        distance_km,
    }))
}

async fn all_places(State(store): State<SharedStore>) -> Result<Json<Catalog>, ApiError> {
    let groups = Group::all();
    let result = catalog(store.as_ref(), &groups).await.map_err(|err| {
        error!(%err, "catalog enumeration failed");
        ApiError::from(err)
    })?;
    Ok(Json(result))
}
