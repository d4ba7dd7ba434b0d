use std::collections::HashMap;

/// Exchange-assigned ticker symbol (e.g. "SBER")
pub type Ticker = String;

/// Latest price per ticker, as produced by one fetch cycle.
///
/// Keys are unique and order is irrelevant. A successful fetch yields a
/// non-empty map; the cache refuses to store an empty one.
pub type QuoteMap = HashMap<Ticker, f64>;

/// A price the pipeline is willing to publish: finite and strictly positive.
pub fn is_publishable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
