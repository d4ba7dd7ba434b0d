use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

use super::quote::{is_publishable_price, QuoteMap};
use crate::schema::SchemaTemplate;

/// One schema-validated retrieval of the securities table.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Declared column layout (equal to the template it was validated against)
    pub columns: Vec<String>,

    /// Raw rows, one per security, positional per `columns`
    pub rows: Vec<Vec<Value>>,

    /// When the table was received
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build the ticker→price mapping by position.
    ///
    /// Rows without a string ticker or a publishable price are skipped.
    /// A ticker appearing twice keeps the last row's price.
    pub fn extract_quotes(&self, template: &SchemaTemplate) -> QuoteMap {
        let mut quotes = QuoteMap::with_capacity(self.rows.len());

        for (i, row) in self.rows.iter().enumerate() {
            let ticker = match row.get(template.ticker_column()).and_then(Value::as_str) {
                Some(t) if !t.is_empty() => t,
                _ => {
                    warn!("Skipping row {}: missing ticker", i);
                    continue;
                }
            };

            let price = match row.get(template.price_column()).and_then(Value::as_f64) {
                Some(p) if is_publishable_price(p) => p,
                other => {
                    warn!(
                        "Skipping {} at row {}: unusable price {:?}",
                        ticker, i, other
                    );
                    continue;
                }
            };

            quotes.insert(ticker.to_string(), price);
        }

        quotes
    }
}
