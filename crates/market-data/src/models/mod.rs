//! Market data models
//!
//! This module contains the core data types for quote retrieval:
//! - `quote` - The ticker→price mapping (QuoteMap) and price sanity rules
//! - `snapshot` - A validated securities table and positional extraction

mod quote;
mod snapshot;

pub use quote::{is_publishable_price, QuoteMap, Ticker};
pub use snapshot::Snapshot;
