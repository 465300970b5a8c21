//! In-memory store implementation.
//!
//! Keeps every group's members in a map and answers queries with haversine
//! distances. Backs the test suite and lets the service run without a live
//! store. Distances differ from the real store's geohash-based math by
//! well under its own documented tolerance.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::GeoIndex;
use crate::error::Result;
use crate::model::{Coordinate, Group};
use crate::proximity::RawRadiusEntry;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// In-process [`GeoIndex`]. Cheap to clone; clones share the same sets.
#[derive(Clone, Default)]
pub struct MemoryGeoStore {
    sets: Arc<Mutex<HashMap<String, BTreeMap<String, Coordinate>>>>,
}

impl MemoryGeoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members currently in a group's set.
    pub async fn member_count(&self, group: &Group) -> usize {
        self.sets
            .lock()
            .await
            .get(&group.key())
            .map_or(0, |set| set.len())
    }
}

#[async_trait]
impl GeoIndex for MemoryGeoStore {
    async fn geo_add(&self, group: &Group, name: &str, coord: Coordinate) -> Result<()> {
        self.sets
            .lock()
            .await
            .entry(group.key())
            .or_default()
            .insert(name.to_string(), coord);
        Ok(())
    }

    async fn geo_radius(
        &self,
        group: &Group,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<RawRadiusEntry>> {
        let sets = self.sets.lock().await;
        let Some(set) = sets.get(&group.key()) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(f64, RawRadiusEntry)> = set
            .iter()
            .filter_map(|(name, coord)| {
                let distance_km = haversine_km(center, *coord);
                (distance_km <= radius_km).then(|| {
                    let entry = RawRadiusEntry::WithCoordinate {
                        name: name.clone(),
                        distance_km,
                        lon: coord.lon,
                        lat: coord.lat,
                    };
                    (distance_km, entry)
                })
            })
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn geo_dist_km(&self, group: &Group, a: &str, b: &str) -> Result<Option<f64>> {
        let sets = self.sets.lock().await;
        let Some(set) = sets.get(&group.key()) else {
            return Ok(None);
        };
        match (set.get(a), set.get(b)) {
            (Some(ca), Some(cb)) => Ok(Some(haversine_km(*ca, *cb))),
            _ => Ok(None),
        }
    }

    async fn remove_member(&self, group: &Group, name: &str) -> Result<()> {
        if let Some(set) = self.sets.lock().await.get_mut(&group.key()) {
            set.remove(name);
        }
        Ok(())
    }

    async fn members(&self, group: &Group) -> Result<Vec<String>> {
        Ok(self
            .sets
            .lock()
            .await
            .get(&group.key())
            .map(|set| set.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn position(&self, group: &Group, name: &str) -> Result<Option<Coordinate>> {
        Ok(self
            .sets
            .lock()
            .await
            .get(&group.key())
            .and_then(|set| set.get(name).copied()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn group(name: &str) -> Group {
        Group::new(name).unwrap()
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_haversine_known_distance() {
        // Buenos Aires Obelisco to Plaza de Mayo, roughly 1 km.
        let obelisco = coord(-34.6037, -58.3816);
        let plaza = coord(-34.6083, -58.3712);
        assert_abs_diff_eq!(haversine_km(obelisco, plaza), 1.08, epsilon = 0.05);

        // One hundredth of a degree of longitude at the equator.
        assert_abs_diff_eq!(
            haversine_km(coord(0.0, 0.0), coord(0.0, 0.01)),
            1.112,
            epsilon = 0.002
        );
    }

    #[tokio::test]
    async fn test_upsert_moves_single_member() {
        let store = MemoryGeoStore::new();
        let g = group("cervecerias");

        store.geo_add(&g, "antares", coord(0.0, 0.0)).await.unwrap();
        store.geo_add(&g, "antares", coord(1.0, 1.0)).await.unwrap();

        assert_eq!(store.member_count(&g).await, 1);
        assert_eq!(
            store.position(&g, "antares").await.unwrap(),
            Some(coord(1.0, 1.0))
        );
    }

    #[tokio::test]
    async fn test_radius_returns_only_points_within() {
        let store = MemoryGeoStore::new();
        let g = group("farmacias");

        store.geo_add(&g, "a", coord(0.0, 0.0)).await.unwrap();
        store.geo_add(&g, "b", coord(0.0, 0.01)).await.unwrap();
        store.geo_add(&g, "c", coord(1.0, 1.0)).await.unwrap();

        let hits = store.geo_radius(&g, coord(0.0, 0.0), 5.0).await.unwrap();
        let names: Vec<_> = hits
            .iter()
            .map(|entry| match entry {
                RawRadiusEntry::WithCoordinate { name, distance_km, .. } => {
                    assert!(*distance_km <= 5.0);
                    name.clone()
                }
                other => panic!("unexpected entry: {other:?}"),
            })
            .collect();

        // Nearest first; c at (1,1) is ~157 km away and excluded.
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_dist_requires_both_members() {
        let store = MemoryGeoStore::new();
        let g = group("farmacias");
        store.geo_add(&g, "a", coord(0.0, 0.0)).await.unwrap();

        assert_eq!(store.geo_dist_km(&g, "a", "missing").await.unwrap(), None);
        assert_eq!(store.geo_dist_km(&g, "missing", "a").await.unwrap(), None);
    }
}
