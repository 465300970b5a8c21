//! Radius-search normalization.
//!
//! Depending on which annotations the store honored, a raw radius reply
//! entry is a bare member name, a name plus distance, or a name plus
//! distance plus coordinate — and the distance may arrive as a double or a
//! numeric string. This module makes those shapes explicit as a tagged
//! variant and normalizes them into one output shape, degrading per entry
//! instead of failing the whole query.

use redis::Value;
use serde::Serialize;
use tracing::debug;

use crate::distance::is_reserved_name;
use crate::error::{PlacesError, Result};
use crate::model::{Coordinate, Group};
use crate::store::GeoIndex;

/// Search radius in kilometers when the caller does not supply one.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Decimal places kept when a distance is presented inside a proximity
/// list. Pairwise distances returned on their own use six (see
/// [`crate::distance`]); the asymmetry is part of the boundary contract.
const LIST_DISTANCE_DECIMALS: u32 = 3;

// ============================================================================
// Shapes
// ============================================================================

/// One raw radius-search hit, tagged by how much the store annotated it.
#[derive(Clone, Debug, PartialEq)]
pub enum RawRadiusEntry {
    Name(String),
    WithDistance { name: String, distance_km: f64 },
    WithCoordinate {
        name: String,
        distance_km: f64,
        lon: f64,
        lat: f64,
    },
}

impl RawRadiusEntry {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::WithDistance { name, .. } => name,
            Self::WithCoordinate { name, .. } => name,
        }
    }
}

/// Normalized hit shape handed to the boundary. Missing annotations stay
/// `None` rather than being invented.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    pub distance_km: Option<f64>,
    pub coord: Option<Coordinate>,
}

// ============================================================================
// Raw reply parsing
// ============================================================================

/// Parses a raw radius reply defensively.
///
/// A malformed entry never aborts the query; it degrades to a name-only
/// entry built from a lossy rendering of the raw value.
pub fn parse_radius_reply(reply: &Value) -> Vec<RawRadiusEntry> {
    let Value::Array(items) = reply else {
        return Vec::new();
    };
    items.iter().map(parse_entry).collect()
}

fn parse_entry(item: &Value) -> RawRadiusEntry {
    let parsed = match item {
        // No annotations honored: a bare member name.
        Value::BulkString(_) | Value::SimpleString(_) => {
            as_string(item).map(RawRadiusEntry::Name).ok_or_else(|| {
                PlacesError::MalformedResult("non-utf8 member name".into())
            })
        }
        Value::Array(fields) => parse_annotated(fields),
        other => Err(PlacesError::MalformedResult(format!(
            "unexpected entry shape: {other:?}"
        ))),
    };

    parsed.unwrap_or_else(|err| {
        debug!(%err, "degrading malformed radius entry");
        RawRadiusEntry::Name(lossy_string(item))
    })
}

fn parse_annotated(fields: &[Value]) -> Result<RawRadiusEntry> {
    let name = fields
        .first()
        .and_then(as_string)
        .ok_or_else(|| PlacesError::MalformedResult("entry without member name".into()))?;

    let Some(dist_field) = fields.get(1) else {
        return Ok(RawRadiusEntry::Name(name));
    };
    if matches!(dist_field, Value::Nil) {
        return Ok(RawRadiusEntry::Name(name));
    }
    let distance_km = as_f64(dist_field).ok_or_else(|| {
        PlacesError::MalformedResult(format!("unparseable distance: {dist_field:?}"))
    })?;

    match fields.get(2) {
        None | Some(Value::Nil) => Ok(RawRadiusEntry::WithDistance { name, distance_km }),
        Some(Value::Array(pair)) => {
            // Positions are encoded longitude first.
            let lon = pair.first().and_then(as_f64);
            let lat = pair.get(1).and_then(as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(RawRadiusEntry::WithCoordinate {
                    name,
                    distance_km,
                    lon,
                    lat,
                }),
                _ => Err(PlacesError::MalformedResult(format!(
                    "unparseable position: {pair:?}"
                ))),
            }
        }
        Some(other) => Err(PlacesError::MalformedResult(format!(
            "unexpected position shape: {other:?}"
        ))),
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Double(d) => Some(*d),
        Value::Int(i) => Some(*i as f64),
        Value::BulkString(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
        Value::SimpleString(s) => s.parse().ok(),
        _ => None,
    }
}

fn lossy_string(value: &Value) -> String {
    match value {
        Value::BulkString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::SimpleString(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Rounds for presentation. Internal computation keeps full precision.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Re-pairs coordinates as lat/lon and rounds distances for presentation.
pub fn normalize(entries: Vec<RawRadiusEntry>) -> Vec<NearbyPlace> {
    entries
        .into_iter()
        .map(|entry| match entry {
            RawRadiusEntry::Name(name) => NearbyPlace {
                name,
                distance_km: None,
                coord: None,
            },
            RawRadiusEntry::WithDistance { name, distance_km } => NearbyPlace {
                name,
                distance_km: Some(round_to(distance_km, LIST_DISTANCE_DECIMALS)),
                coord: None,
            },
            RawRadiusEntry::WithCoordinate {
                name,
                distance_km,
                lon,
                lat,
            } => NearbyPlace {
                name,
                distance_km: Some(round_to(distance_km, LIST_DISTANCE_DECIMALS)),
                coord: Some(Coordinate { lat, lon }),
            },
        })
        .collect()
}

/// Finds indexed places within `radius_km` of `center`, nearest first.
///
/// An in-flight distance probe can momentarily appear in the index; hits
/// carrying the reserved probe prefix are dropped. Store failure
/// propagates — the boundary decides whether to soft-fail.
pub async fn find_nearby<S: GeoIndex + ?Sized>(
    store: &S,
    group: &Group,
    center: Coordinate,
    radius_km: Option<f64>,
) -> Result<Vec<NearbyPlace>> {
    let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
    let mut raw = store.geo_radius(group, center, radius_km).await?;
    raw.retain(|entry| !is_reserved_name(entry.name()));
    Ok(normalize(raw))
}
