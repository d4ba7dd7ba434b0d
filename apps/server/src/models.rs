use chrono::{DateTime, Utc};
use moex_market_data::QuoteMap;
use moex_quote_cache::{AlertSignal, AlertStatus, StockAlert};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PricesResponse {
    pub prices: QuoteMap,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TickerPrice {
    pub ticker: String,
    pub price: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /stock-alerts`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewStockAlert {
    pub ticker: String,
    pub buy_price: f64,
    pub sell_price: f64,
}

/// A tracked stock with its latest price and signal.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackedStock {
    pub ticker: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub price: Option<f64>,
    pub status: Option<AlertStatus>,
    pub deviation_percent: Option<f64>,
}

impl TrackedStock {
    pub fn new(alert: StockAlert, price: Option<f64>, signal: AlertSignal) -> Self {
        Self {
            ticker: alert.ticker,
            buy_price: alert.buy_price,
            sell_price: alert.sell_price,
            price,
            status: signal.status,
            deviation_percent: signal.deviation_percent,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackedStocksResponse {
    pub stocks: Vec<TrackedStock>,
    /// When the prices used for the signals were cached; `None` if no fresh
    /// prices were available and every signal is empty.
    pub prices_updated_at: Option<DateTime<Utc>>,
}
