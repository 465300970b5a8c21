//! Pairwise distance via an ephemeral probe member.
//!
//! The store's pairwise-distance primitive only operates within a single
//! indexed set, so the caller's coordinate is inserted as a transient
//! member of the target group's own set, measured against, and removed.
//! The probe name is unique per call; concurrent computations against the
//! same group never share probe state.

use rand::Rng;
use tracing::debug;

use crate::error::Result;
use crate::model::{Coordinate, Group};
use crate::proximity::round_to;
use crate::store::GeoIndex;

/// Reserved member-name prefix for in-flight probes.
pub(crate) const PROBE_PREFIX: &str = "__probe:";

/// Whether a member name is reserved for probe use. The boundary rejects
/// such names on add, so the probe filters in radius and catalog replies
/// can never swallow real data.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(PROBE_PREFIX)
}

/// Decimal places for a pairwise distance returned on its own.
const PAIRWISE_DECIMALS: u32 = 6;

fn probe_name() -> String {
    let token: u64 = rand::rng().random();
    format!("{PROBE_PREFIX}{token:016x}")
}

/// Distance in kilometers between a stored place and an arbitrary
/// coordinate, rounded to six decimals.
///
/// `Ok(None)` when `name` is not indexed in `group`. The probe is removed
/// even when measurement fails; a cleanup failure is logged and suppressed,
/// never surfacing over the primary outcome.
pub async fn place_distance<S: GeoIndex + ?Sized>(
    store: &S,
    group: &Group,
    name: &str,
    user_coord: Coordinate,
) -> Result<Option<f64>> {
    let probe = probe_name();
    store.geo_add(group, &probe, user_coord).await?;

    let measured = store.geo_dist_km(group, name, &probe).await;

    if let Err(err) = store.remove_member(group, &probe).await {
        debug!(%group, %probe, %err, "probe cleanup failed");
    }

    Ok(measured?.map(|km| round_to(km, PAIRWISE_DECIMALS)))
}
