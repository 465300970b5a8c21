//! # lugares-core
//!
//! Geospatial indexing and query layer for the places service.
//!
//! ## Features
//!
//! - **Store client**: thin [`GeoIndex`](store::GeoIndex) adapter over a
//!   geospatial sorted-set store, one indexed set per group
//! - **Proximity queries**: radius search with defensive normalization of
//!   heterogeneous reply shapes
//! - **Pairwise distance**: ephemeral-probe technique for measuring against
//!   a coordinate that is not itself indexed
//! - **Catalog**: bulk enumeration of every group with per-group failure
//!   isolation
//!
//! Engines are written against the [`store::GeoIndex`] trait;
//! [`store::MemoryGeoStore`] backs the tests, [`store::RedisGeoStore`]
//! backs production.

pub mod catalog;
pub mod distance;
pub mod error;
pub mod model;
pub mod proximity;
pub mod store;

// Re-exports for convenience. `error::Result` stays out of the prelude so
// a glob import never shadows std's two-parameter `Result`.
pub mod prelude {
    pub use crate::catalog::{Catalog, catalog};
    pub use crate::distance::{is_reserved_name, place_distance};
    pub use crate::error::PlacesError;
    pub use crate::model::{Coordinate, Group, KNOWN_GROUPS, Place};
    pub use crate::proximity::{DEFAULT_RADIUS_KM, NearbyPlace, find_nearby};
    pub use crate::store::{GeoIndex, MemoryGeoStore, RedisGeoStore};
}

pub use prelude::*;
