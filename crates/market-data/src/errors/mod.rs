//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The single failure domain for quote retrieval
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while retrieving quotes from the exchange.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The exchange could not be reached, timed out, or answered with a
    /// non-2xx status.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        /// Transport-level description of the failure
        message: String,
    },

    /// The body was not valid JSON or lacked the expected structure.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was missing or unparsable
        message: String,
    },

    /// The liveness probe answered for a different instrument.
    #[error("Unexpected ticker: expected {expected}, got {actual}")]
    UnexpectedTicker {
        /// The reference ticker that was requested
        expected: String,
        /// The ticker found in the response
        actual: String,
    },

    /// The liveness probe returned a price that is not a finite number.
    #[error("Invalid price for {ticker}: {value}")]
    InvalidPrice {
        /// The reference ticker
        ticker: String,
        /// Raw JSON representation of the offending value
        value: String,
    },

    /// The securities table no longer matches the column template.
    /// Extraction is positional, so this invalidates every price in the snapshot.
    #[error("Schema drift at column {position}: expected {expected:?}, found {found:?}")]
    SchemaDrift {
        /// First position where template and response disagree
        position: usize,
        /// Template column at that position (`None` if the response is longer)
        expected: Option<String>,
        /// Response column at that position (`None` if the response is shorter)
        found: Option<String>,
    },

    /// Quotes were requested from a session that has not fetched a snapshot.
    #[error("No snapshot has been fetched in this session")]
    NoSnapshot,
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use moex_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::UpstreamUnavailable { message: "timeout".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SchemaDrift {
    ///     position: 3,
    ///     expected: Some("PREVPRICE".to_string()),
    ///     found: Some("LAST".to_string()),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::UpstreamUnavailable { .. }
            | Self::MalformedResponse { .. }
            | Self::UnexpectedTicker { .. }
            | Self::InvalidPrice { .. } => RetryClass::WithBackoff,

            Self::SchemaDrift { .. } | Self::NoSnapshot => RetryClass::Never,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }
}
