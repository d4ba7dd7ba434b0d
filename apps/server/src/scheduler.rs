//! Background scheduler for periodic quote refresh.
//!
//! Runs one fetch cycle at startup and then one per refresh interval. Cycles
//! never overlap: the loop waits for each to finish before sleeping. After
//! transient upstream failures the wait doubles, up to [`MAX_BACKOFF`].

use std::sync::Arc;
use std::time::Duration;

use moex_market_data::{QuoteSource, RetryClass};
use moex_quote_cache::QuoteCache;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::main_lib::AppState;

/// Longest wait between cycles while the exchange keeps failing
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// What a single refresh cycle achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Prices for this many tickers were cached.
    Stored(usize),
    /// The exchange answered with no usable prices; the cache was left alone.
    Empty,
    /// Fetch succeeded but the store rejected the write.
    StoreFailed,
    /// Fetch failed.
    FetchFailed(RetryClass),
}

/// Starts the background quote refresh scheduler.
pub fn start_quote_refresh_scheduler(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Quote refresh scheduler started ({}s interval, source {})",
            interval.as_secs(),
            state.quote_source.id()
        );

        let mut consecutive_failures = 0u32;
        loop {
            let outcome =
                run_refresh_cycle(state.quote_source.as_ref(), state.quote_cache.as_ref()).await;

            consecutive_failures = match outcome {
                CycleOutcome::FetchFailed(RetryClass::WithBackoff) => {
                    consecutive_failures.saturating_add(1)
                }
                _ => 0,
            };

            let delay = next_delay(interval, consecutive_failures);
            if delay > interval {
                debug!("Backing off: next refresh in {}s", delay.as_secs());
            }
            tokio::time::sleep(delay).await;
        }
    })
}

/// Runs a single fetch → cache cycle.
pub async fn run_refresh_cycle(source: &dyn QuoteSource, cache: &QuoteCache) -> CycleOutcome {
    let quotes = match source.fetch_quotes().await {
        Ok(quotes) => quotes,
        Err(e) => {
            let class = e.retry_class();
            match class {
                RetryClass::WithBackoff => warn!("Quote refresh failed: {}", e),
                RetryClass::Never => error!("Quote refresh failed and needs attention: {}", e),
            }
            return CycleOutcome::FetchFailed(class);
        }
    };

    if quotes.is_empty() {
        warn!("{} returned no usable prices; keeping cached ones", source.id());
        return CycleOutcome::Empty;
    }

    match cache.save_prices(&quotes).await {
        Ok(true) => {
            info!("Cached prices for {} tickers", quotes.len());
            CycleOutcome::Stored(quotes.len())
        }
        Ok(false) => CycleOutcome::StoreFailed,
        Err(e) => {
            // Unreachable with a non-empty map of publishable prices.
            error!("Refusing to cache fetched prices: {}", e);
            CycleOutcome::StoreFailed
        }
    }
}

/// Wait before the next cycle: `interval * 2^failures`, capped.
pub fn next_delay(interval: Duration, consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return interval;
    }
    let factor = 1u32 << consecutive_failures.min(16);
    interval.saturating_mul(factor).min(MAX_BACKOFF.max(interval))
}
