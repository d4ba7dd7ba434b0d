//! Error types for the quote cache and its stores.

use thiserror::Error;

/// Errors surfaced by [`QuoteCache`](crate::QuoteCache).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The caller tried to cache something the cache must never hold,
    /// such as an empty map that would wipe every reader's prices.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No fresh prices: the key is missing, expired, unreadable or the store
    /// is down. Readers cannot tell these apart; logs can.
    #[error("Prices temporarily unavailable")]
    DataUnavailable,

    /// A write did not reach the store. Only ever logged; `save_prices`
    /// reports it as `Ok(false)`.
    #[error("Failed to store prices: {0}")]
    StoreWriteFailed(String),
}

/// Errors surfaced by [`AlertStore`](crate::AlertStore).
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} is not tracked")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by [`KeyValueStore`](crate::KeyValueStore) implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CacheError::DataUnavailable.to_string(),
            "Prices temporarily unavailable"
        );
        assert_eq!(
            CacheError::InvalidArgument("empty price map".to_string()).to_string(),
            "Invalid argument: empty price map"
        );
        assert_eq!(
            StoreError::Backend("connection reset".to_string()).to_string(),
            "Store error: connection reset"
        );
        assert_eq!(
            AlertError::NotFound("SBER".to_string()).to_string(),
            "SBER is not tracked"
        );
    }
}
