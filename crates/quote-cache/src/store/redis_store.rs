use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::KeyValueStore;
use crate::errors::StoreError;

/// Redis-backed [`KeyValueStore`].
///
/// Uses a multiplexed, auto-reconnecting connection. Writes go through a
/// `MULTI`/`EXEC` transaction so the hash and its expiry change together.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`) and verify the
    /// server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        let store = Self { connection };
        store.ping().await?;
        info!("Connected to Redis");
        Ok(store)
    }
}

/// Map a `PTTL` reply to the time left.
///
/// `-2` (no such key), `-1` (no expiry) and `0` (expiring now) all mean there
/// is no fresh window left to report.
fn pttl_to_remaining(ttl_ms: i64) -> Option<Duration> {
    u64::try_from(ttl_ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn replace_hash_with_ttl(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Err(StoreError::Backend(
                "HSET requires at least one field".to_string(),
            ));
        }

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let mut connection = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(key)
            .ignore()
            .hset_multiple(key, fields)
            .ignore()
            .pexpire(key, ttl_ms)
            .ignore();
        let _: () = pipe.query_async(&mut connection).await?;
        Ok(())
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: i64 = connection.hset(key, field, value).await?;
        Ok(())
    }

    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let removed: i64 = connection.hdel(key, field).await?;
        Ok(removed > 0)
    }

    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut connection = self.connection.clone();
        let hash: HashMap<String, String> = connection.hgetall(key).await?;
        Ok(hash)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut connection = self.connection.clone();
        let ttl_ms: i64 = connection.pttl(key).await?;
        Ok(pttl_to_remaining(ttl_ms))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pttl_reply_mapping() {
        assert_eq!(pttl_to_remaining(-2), None);
        assert_eq!(pttl_to_remaining(-1), None);
        assert_eq!(pttl_to_remaining(0), None);
        assert_eq!(pttl_to_remaining(1), Some(Duration::from_millis(1)));
        assert_eq!(pttl_to_remaining(29_500), Some(Duration::from_millis(29_500)));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = RedisStore::connect("not a redis url").await;
        assert!(matches!(result, Err(StoreError::Redis(_))));
    }
}
