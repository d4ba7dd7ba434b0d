//! Tracked stocks with buy/sell price thresholds.
//!
//! Alerts live in one hash (ticker → JSON thresholds) with no expiry, next to
//! the price cache in the same [`KeyValueStore`]. Whether an alert fires is
//! decided on read against the latest cached price; nothing is pushed.

use std::sync::Arc;

use log::{debug, warn};
use moex_market_data::{is_publishable_price, QuoteMap};
use serde::{Deserialize, Serialize};

use crate::errors::AlertError;
use crate::store::KeyValueStore;

/// Key the tracked stocks live under
pub const DEFAULT_ALERTS_KEY: &str = "moex:stock_alerts";

/// A tracked stock and the prices at which to act on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub ticker: String,
    pub buy_price: f64,
    pub sell_price: f64,
}

/// Which threshold the current price has reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// At or below the buy price
    Buy,
    /// At or above the sell price
    Sell,
}

/// An alert evaluated against a price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlertSignal {
    pub status: Option<AlertStatus>,
    /// How far past the reached threshold the price is, in percent of the
    /// threshold, rounded to two decimals. `None` while inside the band.
    pub deviation_percent: Option<f64>,
}

impl AlertSignal {
    const QUIET: Self = Self {
        status: None,
        deviation_percent: None,
    };
}

impl StockAlert {
    /// Builds a validated alert. The ticker is trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// [`AlertError::InvalidArgument`] for an empty or non-alphanumeric
    /// ticker, a price that is not finite and positive, or a buy price above
    /// the sell price.
    pub fn new(ticker: &str, buy_price: f64, sell_price: f64) -> Result<Self, AlertError> {
        let ticker = normalize_ticker(ticker)?;
        for (name, price) in [("buy", buy_price), ("sell", sell_price)] {
            if !is_publishable_price(price) {
                return Err(AlertError::InvalidArgument(format!(
                    "{} price for {} must be a positive number, got {}",
                    name, ticker, price
                )));
            }
        }
        if buy_price > sell_price {
            return Err(AlertError::InvalidArgument(format!(
                "buy price {} for {} is above sell price {}",
                buy_price, ticker, sell_price
            )));
        }
        Ok(Self {
            ticker,
            buy_price,
            sell_price,
        })
    }

    /// Evaluates the alert against `price`. No price, no signal.
    pub fn evaluate(&self, price: Option<f64>) -> AlertSignal {
        let Some(price) = price.filter(|p| is_publishable_price(*p)) else {
            return AlertSignal::QUIET;
        };

        if price <= self.buy_price {
            AlertSignal {
                status: Some(AlertStatus::Buy),
                deviation_percent: Some(percent_beyond(self.buy_price - price, self.buy_price)),
            }
        } else if price >= self.sell_price {
            AlertSignal {
                status: Some(AlertStatus::Sell),
                deviation_percent: Some(percent_beyond(price - self.sell_price, self.sell_price)),
            }
        } else {
            AlertSignal::QUIET
        }
    }
}

fn percent_beyond(distance: f64, threshold: f64) -> f64 {
    (distance / threshold * 10_000.0).round() / 100.0
}

/// Trims and uppercases a ticker, rejecting anything that is not a plain
/// exchange symbol.
pub fn normalize_ticker(ticker: &str) -> Result<String, AlertError> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() || !ticker.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AlertError::InvalidArgument(format!(
            "invalid ticker {:?}",
            ticker
        )));
    }
    Ok(ticker)
}

/// Persistent set of [`StockAlert`]s, one per ticker.
pub struct AlertStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl AlertStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Starts tracking `alert.ticker`, replacing any thresholds it had.
    pub async fn upsert(&self, alert: &StockAlert) -> Result<(), AlertError> {
        let value = serde_json::to_string(alert)
            .map_err(|e| AlertError::InvalidArgument(e.to_string()))?;
        self.store
            .set_hash_field(&self.key, &alert.ticker, &value)
            .await?;
        debug!(
            "Tracking {} (buy {}, sell {})",
            alert.ticker, alert.buy_price, alert.sell_price
        );
        Ok(())
    }

    /// All tracked stocks, ordered by ticker. Unreadable entries are logged
    /// and left out.
    pub async fn list(&self) -> Result<Vec<StockAlert>, AlertError> {
        let raw = self.store.read_hash(&self.key).await?;
        let mut alerts: Vec<StockAlert> = raw
            .into_iter()
            .filter_map(|(ticker, value)| match serde_json::from_str(&value) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    warn!("Skipping unreadable alert for {}: {}", ticker, e);
                    None
                }
            })
            .collect();
        alerts.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(alerts)
    }

    /// Stops tracking `ticker` (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`AlertError::NotFound`] if the ticker was not tracked.
    pub async fn remove(&self, ticker: &str) -> Result<(), AlertError> {
        let ticker = normalize_ticker(ticker)?;
        if self.store.delete_hash_field(&self.key, &ticker).await? {
            debug!("Stopped tracking {}", ticker);
            Ok(())
        } else {
            Err(AlertError::NotFound(ticker))
        }
    }
}

/// Pairs every alert with its price in `prices` and the resulting signal.
pub fn evaluate_all(
    alerts: Vec<StockAlert>,
    prices: &QuoteMap,
) -> Vec<(StockAlert, Option<f64>, AlertSignal)> {
    alerts
        .into_iter()
        .map(|alert| {
            let price = prices.get(&alert.ticker).copied();
            let signal = alert.evaluate(price);
            (alert, price, signal)
        })
        .collect()
}
