//! MOEX Market Data Crate
//!
//! This crate retrieves the latest share prices from the Moscow Exchange ISS
//! API and turns them into a ticker→price mapping that is safe to publish.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |    MoexClient    |  (QuoteSource)
//! +------------------+
//!          |
//!          v
//! +------------------+     liveness probe (reference ticker)
//! | SnapshotSession  | --> securities table
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  SchemaTemplate  |  (fails closed on column drift)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     QuoteMap     |  (ticker -> price)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MoexClient`] - ISS client; one fetch cycle per [`SnapshotSession`]
//! - [`SchemaTemplate`] - Expected securities layout and extraction positions
//! - [`QuoteMap`] - Ticker→price mapping handed to the cache
//! - [`MarketDataError`] - Single failure domain with [`RetryClass`]

pub mod errors;
pub mod models;
pub mod provider;
pub mod schema;

pub use errors::{MarketDataError, RetryClass};
pub use models::{is_publishable_price, QuoteMap, Snapshot, Ticker};
pub use provider::moex::{MoexClient, MoexConfig, SnapshotSession};
pub use provider::{HttpTransport, QuoteSource, QuoteTransport, DEFAULT_REQUEST_TIMEOUT};
pub use schema::SchemaTemplate;
