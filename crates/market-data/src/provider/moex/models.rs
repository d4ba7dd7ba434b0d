//! MOEX ISS response shapes.
//!
//! With `iss.meta=off` every block is `{"columns": [...], "data": [[...], ...]}`.
//! Only the blocks the client reads are modelled; everything else is ignored.

use serde::Deserialize;
use serde_json::Value;

/// Body of the single-instrument request (`iss.only=marketdata`).
#[derive(Debug, Deserialize)]
pub(crate) struct MarketDataResponse {
    pub marketdata: MarketDataBlock,
}

/// `marketdata` block, restricted to `SECID,LAST`.
#[derive(Debug, Deserialize)]
pub(crate) struct MarketDataBlock {
    pub data: Vec<Vec<Value>>,
}

/// Body of the board-wide securities request.
#[derive(Debug, Deserialize)]
pub(crate) struct SecuritiesResponse {
    pub securities: SecuritiesBlock,
}

/// `securities` block with its declared column layout.
#[derive(Debug, Deserialize)]
pub(crate) struct SecuritiesBlock {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}
