use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// The minimal key-value capability the quote cache and alert store need.
///
/// A key holds a hash of string fields and an optional expiry. Expired keys
/// must be indistinguishable from missing ones.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Replace every field of `key` with `fields` and set its expiry to `ttl`.
    ///
    /// Must be atomic: no reader may observe the new fields without the new
    /// expiry, the new expiry without the new fields, or a mix of old and new
    /// fields.
    async fn replace_hash_with_ttl(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Set one field of `key`, creating the key without expiry if missing.
    /// An existing expiry is left as is.
    async fn set_hash_field(&self, key: &str, field: &str, value: &str)
        -> Result<(), StoreError>;

    /// Remove one field of `key`. Returns whether the field existed.
    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// All fields of `key`. Empty when the key is missing or expired.
    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Time left before `key` expires. `None` when the key is missing or has
    /// no expiry.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Round-trip check used at startup.
    async fn ping(&self) -> Result<(), StoreError>;
}
