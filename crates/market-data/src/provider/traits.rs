//! Quote source and transport trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::QuoteMap;

/// Raw HTTP access to the exchange.
///
/// Implementations must bound every request with a timeout and report
/// transport failures, timeouts and non-2xx statuses as
/// [`MarketDataError::UpstreamUnavailable`]. Body interpretation is left to
/// the caller.
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    /// GET `url` and return the response body.
    async fn get(&self, url: &str) -> Result<String, MarketDataError>;
}

/// A source of complete ticker→price snapshots.
///
/// The scheduler depends on this trait rather than on a concrete exchange
/// client so that fetch cycles can be driven against fakes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Unique identifier for this source, used in logs.
    fn id(&self) -> &'static str;

    /// Cheap availability check against a single reference instrument.
    async fn probe_liveness(&self) -> Result<f64, MarketDataError>;

    /// Run one full fetch cycle and return the extracted quotes.
    ///
    /// Implementations must probe first and skip the full request if the
    /// probe fails.
    async fn fetch_quotes(&self) -> Result<QuoteMap, MarketDataError>;
}
