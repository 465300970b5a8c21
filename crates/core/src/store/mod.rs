//! Store abstraction and implementations.

pub mod memory_store;
pub mod redis_store;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Coordinate, Group};
use crate::proximity::RawRadiusEntry;

pub use memory_store::MemoryGeoStore;
pub use redis_store::RedisGeoStore;

/// Primitive operations against a geospatially indexed sorted-set store.
///
/// [`RedisGeoStore`] talks to a live store over one shared connection;
/// [`MemoryGeoStore`] keeps everything in process for tests and local runs.
/// Higher-level operations (proximity, distance, catalog) are written
/// against this trait only.
#[async_trait]
pub trait GeoIndex: Send + Sync {
    /// Upserts a member into the group's indexed set. Re-adding an
    /// existing name moves it; there is no insert-only mode.
    async fn geo_add(&self, group: &Group, name: &str, coord: Coordinate) -> Result<()>;

    /// Radius search around `center` in kilometers, nearest first, with
    /// whatever distance/coordinate annotations the store returns.
    async fn geo_radius(
        &self,
        group: &Group,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<RawRadiusEntry>>;

    /// Pairwise distance in kilometers between two members of the same
    /// set; `None` when either member is absent.
    async fn geo_dist_km(&self, group: &Group, a: &str, b: &str) -> Result<Option<f64>>;

    /// Removes one member from the group's set.
    async fn remove_member(&self, group: &Group, name: &str) -> Result<()>;

    /// All member names in the group's set.
    async fn members(&self, group: &Group) -> Result<Vec<String>>;

    /// Coordinate of one member; `None` when absent.
    async fn position(&self, group: &Group, name: &str) -> Result<Option<Coordinate>>;

    /// Store liveness probe.
    async fn ping(&self) -> Result<()>;
}
