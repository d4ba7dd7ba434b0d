//! MOEX Quote Cache Crate
//!
//! Publishes the latest ticker→price mapping into a shared key-value store
//! with a fixed time-to-live, and serves it back to readers.
//!
//! # Guarantees
//!
//! - A write replaces the whole mapping and restarts the TTL in one atomic
//!   step; readers never see a half-written map or a map without expiry.
//! - An empty mapping is never written.
//! - Tracked-stock alerts live under their own key with no expiry and are
//!   evaluated against the cached prices on read.
//! - Readers get either fresh prices or [`CacheError::DataUnavailable`].
//!
//! # Core Types
//!
//! - [`QuoteCache`] - save/get prices and report their age
//! - [`CacheConfig`] - cache key and TTL window
//! - [`KeyValueStore`] - store capability set, with [`RedisStore`] and
//!   [`MemoryStore`] implementations
//! - [`AlertStore`] / [`StockAlert`] - tracked stocks with buy/sell thresholds

pub mod alerts;
mod cache;
pub mod config;
pub mod errors;
pub mod store;

pub use alerts::{
    evaluate_all, AlertSignal, AlertStatus, AlertStore, StockAlert, DEFAULT_ALERTS_KEY,
};
pub use cache::QuoteCache;
pub use config::{CacheConfig, DEFAULT_CACHE_KEY, DEFAULT_CACHE_TTL};
pub use errors::{AlertError, CacheError, StoreError};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
