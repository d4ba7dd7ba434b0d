//! Schema guard for the securities table.
//!
//! Quote extraction reads the ticker and the price by position, so a renamed,
//! inserted, removed or reordered column would silently shift every price.
//! [`SchemaTemplate::verify`] fails closed on any such change.

use std::sync::Arc;

use crate::errors::MarketDataError;

/// Column layout of the MOEX `securities` table on the shares boards.
pub const MOEX_SHARES_COLUMNS: &[&str] = &[
    "SECID",
    "BOARDID",
    "SHORTNAME",
    "PREVPRICE",
    "LOTSIZE",
    "FACEVALUE",
    "STATUS",
    "BOARDNAME",
    "DECIMALS",
    "SECNAME",
    "REMARKS",
    "MARKETCODE",
    "INSTRID",
    "SECTORID",
    "MINSTEP",
    "PREVWAPRICE",
    "FACEUNIT",
    "PREVDATE",
    "ISSUESIZE",
    "ISIN",
    "LATNAME",
    "REGNUMBER",
    "PREVLEGALCLOSEPRICE",
    "CURRENCYID",
    "SECTYPE",
    "LISTLEVEL",
    "SETTLEDATE",
];

/// Position of `SECID` in [`MOEX_SHARES_COLUMNS`].
pub const MOEX_TICKER_COLUMN: usize = 0;

/// Position of `PREVPRICE` in [`MOEX_SHARES_COLUMNS`].
pub const MOEX_PRICE_COLUMN: usize = 3;

/// Expected ordered column list plus the positions extraction reads from.
///
/// Immutable once built; cloning shares the column list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaTemplate {
    columns: Arc<[String]>,
    ticker_column: usize,
    price_column: usize,
}

impl SchemaTemplate {
    /// Build a template. Returns `None` if either extraction position falls
    /// outside the column list.
    pub fn new<I, S>(columns: I, ticker_column: usize, price_column: usize) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        if ticker_column >= columns.len() || price_column >= columns.len() {
            return None;
        }
        Some(Self {
            columns,
            ticker_column,
            price_column,
        })
    }

    /// The TQBR shares layout: ticker from `SECID`, price from `PREVPRICE`.
    pub fn moex_shares() -> Self {
        Self {
            columns: MOEX_SHARES_COLUMNS.iter().map(|c| c.to_string()).collect(),
            ticker_column: MOEX_TICKER_COLUMN,
            price_column: MOEX_PRICE_COLUMN,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ticker_column(&self) -> usize {
        self.ticker_column
    }

    pub fn price_column(&self) -> usize {
        self.price_column
    }

    /// Exact, ordered, full-length comparison against a live column list.
    ///
    /// Reports the first position where the two disagree.
    pub fn verify<S: AsRef<str>>(&self, actual: &[S]) -> Result<(), MarketDataError> {
        let len = self.columns.len().max(actual.len());
        for position in 0..len {
            let expected = self.columns.get(position).map(String::as_str);
            let found: Option<&str> = actual.get(position).map(|c| c.as_ref());
            if expected != found {
                return Err(MarketDataError::SchemaDrift {
                    position,
                    expected: expected.map(str::to_string),
                    found: found.map(str::to_string),
                });
            }
        }
        Ok(())
    }
}

impl Default for SchemaTemplate {
    fn default() -> Self {
        Self::moex_shares()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_columns() -> Vec<String> {
        MOEX_SHARES_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn assert_drift_at(result: Result<(), MarketDataError>, at: usize) {
        match result {
            Err(MarketDataError::SchemaDrift { position, .. }) => assert_eq!(position, at),
            other => panic!("expected SchemaDrift at {}, got {:?}", at, other),
        }
    }

    #[test]
    fn test_extraction_positions_match_column_names() {
        let template = SchemaTemplate::moex_shares();
        assert_eq!(template.columns()[template.ticker_column()], "SECID");
        assert_eq!(template.columns()[template.price_column()], "PREVPRICE");
        assert_eq!(template.columns().len(), 27);
    }

    #[test]
    fn test_identical_layout_passes() {
        let template = SchemaTemplate::moex_shares();
        assert!(template.verify(&live_columns()).is_ok());
    }

    #[test]
    fn test_added_column_is_drift() {
        let mut columns = live_columns();
        columns.push("LISTINGDATE".to_string());
        assert_drift_at(SchemaTemplate::moex_shares().verify(&columns), 27);
    }

    #[test]
    fn test_removed_column_is_drift() {
        let mut columns = live_columns();
        columns.remove(5);
        assert_drift_at(SchemaTemplate::moex_shares().verify(&columns), 5);
    }

    #[test]
    fn test_reordered_columns_are_drift() {
        let mut columns = live_columns();
        columns.swap(2, 3);
        assert_drift_at(SchemaTemplate::moex_shares().verify(&columns), 2);
    }

    #[test]
    fn test_renamed_column_is_drift() {
        let mut columns = live_columns();
        columns[3] = "LAST".to_string();

        match SchemaTemplate::moex_shares().verify(&columns) {
            Err(MarketDataError::SchemaDrift {
                position,
                expected,
                found,
            }) => {
                assert_eq!(position, 3);
                assert_eq!(expected.as_deref(), Some("PREVPRICE"));
                assert_eq!(found.as_deref(), Some("LAST"));
            }
            other => panic!("expected SchemaDrift, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_layout_is_drift() {
        let columns: Vec<String> = Vec::new();
        assert_drift_at(SchemaTemplate::moex_shares().verify(&columns), 0);
    }

    #[test]
    fn test_custom_template_rejects_out_of_range_positions() {
        assert!(SchemaTemplate::new(["SECID", "LAST"], 0, 1).is_some());
        assert!(SchemaTemplate::new(["SECID", "LAST"], 0, 2).is_none());
    }
}
