use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::KeyValueStore;
use crate::errors::StoreError;

#[derive(Debug)]
struct Entry {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process [`KeyValueStore`] with expiry on the Tokio clock.
///
/// Every operation runs under one lock, which gives the same all-or-nothing
/// visibility as a Redis transaction. Used when no Redis is configured and
/// throughout the tests (the clock can be paused and advanced).
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn replace_hash_with_ttl(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                fields: fields.iter().cloned().collect(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                fields: HashMap::new(),
                expires_at: None,
            })
            .fields
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        let Some(entry) = entries.get_mut(key) else {
            return Ok(false);
        };
        let removed = entry.fields.remove(field).is_some();
        // Like Redis, a hash with no fields left is gone.
        if entry.fields.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.fields.clone())
            .unwrap_or_default())
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| at - now))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
