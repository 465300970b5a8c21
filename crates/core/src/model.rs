//! Core data types: coordinates, places, and group partitions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PlacesError, Result};

/// Categories this deployment indexes. Each group backs exactly one
/// geospatial sorted set in the store.
pub const KNOWN_GROUPS: &[&str] = &[
    "cervecerias",
    "universidades",
    "farmacias",
    "emergencias",
    "supermercados",
];

/// Prefix for the store key derived from a group name.
const KEY_PREFIX: &str = "geo:";

// ============================================================================
// Coordinate
// ============================================================================

/// A latitude/longitude pair in degrees.
///
/// Stored precision is bound by the store's 52-bit interleaved geohash
/// encoding: roughly ±1 m at low latitudes, degrading toward the poles.
/// That limitation is owned by the store and not corrected here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if !lat_ok || !lon_ok {
            return Err(PlacesError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

// ============================================================================
// Place
// ============================================================================

/// A named point within one group. Names are unique per group; re-adding a
/// name moves it (upsert semantics, enforced by the store).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

// ============================================================================
// Group
// ============================================================================

/// A validated category name, addressing one geospatial index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Group(Arc<str>);

impl Group {
    /// Validates a group name against [`KNOWN_GROUPS`].
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if KNOWN_GROUPS.contains(&name) {
            Ok(Self(name.into()))
        } else {
            Err(PlacesError::UnknownGroup(name.to_string()))
        }
    }

    /// Every known group, in declaration order.
    pub fn all() -> Vec<Group> {
        KNOWN_GROUPS.iter().map(|name| Self((*name).into())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key backing this group's indexed set.
    pub fn key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
