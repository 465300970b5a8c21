//! Bulk enumeration of every indexed place.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::distance::is_reserved_name;
use crate::error::{PlacesError, Result};
use crate::model::{Group, Place};
use crate::store::GeoIndex;

/// Everything the service has indexed, keyed by group. Groups with no
/// members are omitted; `total` is the sum of the included lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub groups: BTreeMap<String, Vec<Place>>,
    pub total: usize,
}

/// Enumerates all members of each given group with their coordinates.
///
/// A failure enumerating one group is logged and that group skipped; the
/// rest of the catalog still builds. Only when every group fails is the
/// store considered down and the error propagated.
pub async fn catalog<S: GeoIndex + ?Sized>(store: &S, groups: &[Group]) -> Result<Catalog> {
    let mut out = Catalog::default();
    let mut failed = 0usize;
    let mut last_error = None;

    for group in groups {
        let mut names = match store.members(group).await {
            Ok(names) => names,
            Err(err) => {
                warn!(%group, %err, "skipping group in catalog");
                failed += 1;
                last_error = Some(err);
                continue;
            }
        };
        names.retain(|name| !is_reserved_name(name));

        let mut places = Vec::with_capacity(names.len());
        for name in names {
            match store.position(group, &name).await {
                Ok(Some(coord)) => places.push(Place {
                    name,
                    lat: coord.lat,
                    lon: coord.lon,
                }),
                // Member vanished between enumeration and lookup.
                Ok(None) => {}
                Err(err) => warn!(%group, %name, %err, "position lookup failed"),
            }
        }

        if places.is_empty() {
            continue;
        }
        out.total += places.len();
        out.groups.insert(group.as_str().to_string(), places);
    }

    if !groups.is_empty() && failed == groups.len() {
        return Err(last_error.unwrap_or_else(|| {
            PlacesError::StoreUnavailable("all groups failed to enumerate".into())
        }));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacesError;
    use crate::model::Coordinate;
    use crate::proximity::RawRadiusEntry;
    use crate::store::MemoryGeoStore;
    use async_trait::async_trait;

    fn group(name: &str) -> Group {
        Group::new(name).unwrap()
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn test_totals_and_empty_group_omission() {
        let store = MemoryGeoStore::new();
        store
            .geo_add(&group("farmacias"), "a", coord(0.0, 0.0))
            .await
            .unwrap();
        store
            .geo_add(&group("farmacias"), "b", coord(0.0, 0.01))
            .await
            .unwrap();
        store
            .geo_add(&group("cervecerias"), "c", coord(1.0, 1.0))
            .await
            .unwrap();

        let result = catalog(&store, &Group::all()).await.unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups["farmacias"].len(), 2);
        assert_eq!(result.groups["cervecerias"].len(), 1);
        assert!(!result.groups.contains_key("universidades"));
    }

    #[tokio::test]
    async fn test_empty_store_is_empty_catalog() {
        let store = MemoryGeoStore::new();
        let result = catalog(&store, &Group::all()).await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.groups.is_empty());
    }

    #[tokio::test]
    async fn test_probe_members_are_hidden() {
        let store = MemoryGeoStore::new();
        let g = group("farmacias");
        store.geo_add(&g, "a", coord(0.0, 0.0)).await.unwrap();
        store
            .geo_add(&g, "__probe:deadbeefdeadbeef", coord(0.0, 0.0))
            .await
            .unwrap();

        let result = catalog(&store, &[g]).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.groups["farmacias"][0].name, "a");
    }

    /// Fails enumeration for one named group only.
    struct OneGroupDown {
        inner: MemoryGeoStore,
        down: &'static str,
    }

    #[async_trait]
    impl GeoIndex for OneGroupDown {
        async fn geo_add(&self, group: &Group, name: &str, coord: Coordinate) -> Result<()> {
            self.inner.geo_add(group, name, coord).await
        }

        async fn geo_radius(
            &self,
            group: &Group,
            center: Coordinate,
            radius_km: f64,
        ) -> Result<Vec<RawRadiusEntry>> {
            self.inner.geo_radius(group, center, radius_km).await
        }

        async fn geo_dist_km(&self, group: &Group, a: &str, b: &str) -> Result<Option<f64>> {
            self.inner.geo_dist_km(group, a, b).await
        }

        async fn remove_member(&self, group: &Group, name: &str) -> Result<()> {
            self.inner.remove_member(group, name).await
        }

        async fn members(&self, group: &Group) -> Result<Vec<String>> {
            if group.as_str() == self.down {
                return Err(PlacesError::StoreUnavailable("partition lost".into()));
            }
            self.inner.members(group).await
        }

        async fn position(&self, group: &Group, name: &str) -> Result<Option<Coordinate>> {
            self.inner.position(group, name).await
        }

        async fn ping(&self) -> Result<()> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_one_failing_group_does_not_abort_the_rest() {
        let inner = MemoryGeoStore::new();
        inner
            .geo_add(&group("farmacias"), "a", coord(0.0, 0.0))
            .await
            .unwrap();
        inner
            .geo_add(&group("emergencias"), "same", coord(2.0, 2.0))
            .await
            .unwrap();
        let store = OneGroupDown {
            inner,
            down: "emergencias",
        };

        let result = catalog(&store, &Group::all()).await.unwrap();
        assert_eq!(result.total, 1);
        assert!(result.groups.contains_key("farmacias"));
        assert!(!result.groups.contains_key("emergencias"));
    }

    #[tokio::test]
    async fn test_every_group_failing_propagates() {
        struct AllDown;

        #[async_trait]
        impl GeoIndex for AllDown {
            async fn geo_add(&self, _: &Group, _: &str, _: Coordinate) -> Result<()> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn geo_radius(
                &self,
                _: &Group,
                _: Coordinate,
                _: f64,
            ) -> Result<Vec<RawRadiusEntry>> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn geo_dist_km(&self, _: &Group, _: &str, _: &str) -> Result<Option<f64>> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn remove_member(&self, _: &Group, _: &str) -> Result<()> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn members(&self, _: &Group) -> Result<Vec<String>> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn position(&self, _: &Group, _: &str) -> Result<Option<Coordinate>> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }

            async fn ping(&self) -> Result<()> {
                Err(PlacesError::StoreUnavailable("down".into()))
            }
        }

        let result = catalog(&AllDown, &Group::all()).await;
        assert!(matches!(result, Err(PlacesError::StoreUnavailable(_))));
    }
}
