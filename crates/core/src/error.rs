//! Error taxonomy for store and query operations.
//!
//! Each variant maps to one propagation policy at the HTTP boundary:
//! `StoreUnavailable` hard-fails (or soft-fails, per endpoint),
//! `InvalidCoordinate` and `UnknownGroup` reject the request,
//! `NotFound` is the 404 path, and `MalformedResult` only ever occurs
//! per-entry inside radius-reply parsing and is never propagated.

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("place not found: {0}")]
    NotFound(String),

    #[error("malformed radius result: {0}")]
    MalformedResult(String),
}

pub type Result<T> = std::result::Result<T, PlacesError>;
