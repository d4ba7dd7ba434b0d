//! TTL-bounded shared storage for the latest quotes.
//!
//! Per key the cache moves through `Empty → Fresh → Expired → Fresh …`.
//! Expiry is driven by the store; nothing here deletes prices explicitly.
//! Only `Fresh` data is ever served.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use moex_market_data::{is_publishable_price, QuoteMap};

use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::store::KeyValueStore;

/// Latest-prices cache over a [`KeyValueStore`].
///
/// The pipeline is the only writer of the configured key; any number of
/// readers may call [`get_prices`](Self::get_prices) concurrently. Overlapping
/// writers resolve as last-writer-wins.
pub struct QuoteCache {
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
}

impl QuoteCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Replace the cached prices and restart the TTL window, atomically.
    ///
    /// Returns `Ok(false)` if the store rejected the write; the next refresh
    /// cycle will try again.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] for an empty map or a map holding a
    /// non-finite or non-positive price. The store is not touched.
    pub async fn save_prices(&self, prices: &QuoteMap) -> Result<bool, CacheError> {
        if prices.is_empty() {
            return Err(CacheError::InvalidArgument(
                "Cannot cache an empty price map".to_string(),
            ));
        }
        if let Some((ticker, price)) = prices.iter().find(|(_, p)| !is_publishable_price(**p)) {
            return Err(CacheError::InvalidArgument(format!(
                "Refusing to cache {} at price {}",
                ticker, price
            )));
        }

        let fields: Vec<(String, String)> = prices
            .iter()
            .map(|(ticker, price)| (ticker.clone(), price.to_string()))
            .collect();

        match self
            .store
            .replace_hash_with_ttl(&self.config.key, &fields, self.config.ttl)
            .await
        {
            Ok(()) => {
                debug!("Cached prices for {} tickers", prices.len());
                Ok(true)
            }
            Err(e) => {
                error!("{}", CacheError::StoreWriteFailed(e.to_string()));
                Ok(false)
            }
        }
    }

    /// The cached prices, if fresh.
    ///
    /// # Errors
    ///
    /// [`CacheError::DataUnavailable`] when nothing fresh is cached or the
    /// store cannot be read. The cause is logged.
    pub async fn get_prices(&self) -> Result<QuoteMap, CacheError> {
        let raw = self.store.read_hash(&self.config.key).await.map_err(|e| {
            error!("Failed to read cached prices: {}", e);
            CacheError::DataUnavailable
        })?;

        if raw.is_empty() {
            debug!("No fresh prices under {}", self.config.key);
            return Err(CacheError::DataUnavailable);
        }

        raw.into_iter()
            .map(|(ticker, price)| match price.parse::<f64>() {
                Ok(value) => Ok((ticker, value)),
                Err(e) => {
                    error!("Cached price for {} is unreadable ({:?}): {}", ticker, price, e);
                    Err(CacheError::DataUnavailable)
                }
            })
            .collect()
    }

    /// When the cached prices were written, reconstructed from the remaining
    /// TTL as `now - (ttl - remaining)`.
    ///
    /// Only accurate while every write resets the full window and the window
    /// length is unchanged since the last write. `None` if nothing is cached.
    pub async fn get_last_update_time(&self) -> Option<DateTime<Utc>> {
        let remaining = match self.store.remaining_ttl(&self.config.key).await {
            Ok(Some(remaining)) => remaining,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache TTL: {}", e);
                return None;
            }
        };

        let age = self.config.ttl.saturating_sub(remaining);
        let age = chrono::Duration::from_std(age).ok()?;
        Some(Utc::now() - age)
    }
}
