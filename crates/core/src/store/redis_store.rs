//! Live store client over one shared multiplexed connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, FromRedisValue, Value};
use tokio::time::timeout;

use super::GeoIndex;
use crate::error::{PlacesError, Result};
use crate::model::{Coordinate, Group};
use crate::proximity::{RawRadiusEntry, as_f64, parse_radius_reply};

/// Explicitly constructed store client, opened once at startup and shared
/// by every request handler. Cloning shares the underlying connection; the
/// store serializes commands server-side, so no client-side locking is
/// needed.
#[derive(Clone)]
pub struct RedisGeoStore {
    conn: ConnectionManager,
    call_timeout: Duration,
}

impl RedisGeoStore {
    /// Connects and verifies the connection can be established. Every
    /// subsequent call is bounded by `call_timeout`; an elapsed timeout is
    /// reported as `StoreUnavailable`.
    pub async fn connect(url: &str, call_timeout: Duration) -> Result<Self> {
        let client = Client::open(url).map_err(store_error)?;
        let conn = ConnectionManager::new(client).await.map_err(store_error)?;
        Ok(Self { conn, call_timeout })
    }

    async fn run<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T> {
        let mut conn = self.conn.clone();
        match timeout(self.call_timeout, cmd.query_async::<T>(&mut conn)).await {
            Ok(reply) => reply.map_err(store_error),
            Err(_) => Err(PlacesError::StoreUnavailable(format!(
                "store call timed out after {:?}",
                self.call_timeout
            ))),
        }
    }
}

fn store_error(err: redis::RedisError) -> PlacesError {
    PlacesError::StoreUnavailable(err.to_string())
}

#[async_trait]
impl GeoIndex for RedisGeoStore {
    async fn geo_add(&self, group: &Group, name: &str, coord: Coordinate) -> Result<()> {
        let mut cmd = redis::cmd("GEOADD");
        cmd.arg(group.key()).arg(coord.lon).arg(coord.lat).arg(name);
        // Coordinates are validated before they get here, but the store
        // still has the final say on what its encoding accepts.
        self.run::<i64>(&cmd).await.map_err(|err| match err {
            PlacesError::StoreUnavailable(msg) if msg.contains("invalid longitude,latitude") => {
                PlacesError::InvalidCoordinate {
                    lat: coord.lat,
                    lon: coord.lon,
                }
            }
            other => other,
        })?;
        Ok(())
    }

    async fn geo_radius(
        &self,
        group: &Group,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<RawRadiusEntry>> {
        let mut cmd = redis::cmd("GEOSEARCH");
        cmd.arg(group.key())
            .arg("FROMLONLAT")
            .arg(center.lon)
            .arg(center.lat)
            .arg("BYRADIUS")
            .arg(radius_km)
            .arg("km")
            .arg("ASC")
            .arg("WITHCOORD")
            .arg("WITHDIST");
        let reply: Value = self.run(&cmd).await?;
        Ok(parse_radius_reply(&reply))
    }

    async fn geo_dist_km(&self, group: &Group, a: &str, b: &str) -> Result<Option<f64>> {
        let mut cmd = redis::cmd("GEODIST");
        cmd.arg(group.key()).arg(a).arg(b).arg("km");
        self.run(&cmd).await
    }

    async fn remove_member(&self, group: &Group, name: &str) -> Result<()> {
        let mut cmd = redis::cmd("ZREM");
        cmd.arg(group.key()).arg(name);
        self.run::<i64>(&cmd).await?;
        Ok(())
    }

    async fn members(&self, group: &Group) -> Result<Vec<String>> {
        let mut cmd = redis::cmd("ZRANGE");
        cmd.arg(group.key()).arg(0).arg(-1);
        self.run(&cmd).await
    }

    async fn position(&self, group: &Group, name: &str) -> Result<Option<Coordinate>> {
        let mut cmd = redis::cmd("GEOPOS");
        cmd.arg(group.key()).arg(name);
        let reply: Value = self.run(&cmd).await?;
        Ok(parse_position_reply(&reply))
    }

    async fn ping(&self) -> Result<()> {
        self.run::<String>(&redis::cmd("PING")).await?;
        Ok(())
    }
}

/// GEOPOS replies with one entry per queried member: either nil or a
/// longitude-then-latitude pair.
fn parse_position_reply(reply: &Value) -> Option<Coordinate> {
    let Value::Array(entries) = reply else {
        return None;
    };
    let Value::Array(pair) = entries.first()? else {
        return None;
    };
    let lon = pair.first().and_then(as_f64)?;
    let lat = pair.get(1).and_then(as_f64)?;
    Some(Coordinate { lat, lon })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_position_pair() {
        let reply = Value::Array(vec![Value::Array(vec![
            bulk("-58.38160189986228943"),
            bulk("-34.60369987funny"),
        ])]);
        // Second field is garbage, whole position is discarded.
        assert_eq!(parse_position_reply(&reply), None);

        let reply = Value::Array(vec![Value::Array(vec![
            bulk("-58.3816018998622894"),
            bulk("-34.6036998760794009"),
        ])]);
        let coord = parse_position_reply(&reply).unwrap();
        assert!((coord.lon - -58.3816019).abs() < 1e-6);
        assert!((coord.lat - -34.6036999).abs() < 1e-6);
    }

    #[test]
    fn test_parse_position_missing_member() {
        let reply = Value::Array(vec![Value::Nil]);
        assert_eq!(parse_position_reply(&reply), None);
        assert_eq!(parse_position_reply(&Value::Nil), None);
    }
}
