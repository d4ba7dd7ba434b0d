use std::time::Duration;

/// Key the latest prices live under
pub const DEFAULT_CACHE_KEY: &str = "moex:latest_prices";

/// How long a written snapshot stays fresh
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Where and for how long the cache keeps prices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub key: String,
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_KEY, DEFAULT_CACHE_TTL)
    }
}
