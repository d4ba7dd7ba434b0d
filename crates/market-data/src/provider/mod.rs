//! Quote source abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteSource` trait the refresh scheduler drives
//! - The `QuoteTransport` trait isolating raw HTTP access
//! - `HttpTransport`, the reqwest-backed transport
//! - The Moscow Exchange client (`moex`)

mod http;
mod traits;

pub mod moex;

// Re-exports
pub use http::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
pub use traits::{QuoteSource, QuoteTransport};
