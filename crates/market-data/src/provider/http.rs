use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::MarketDataError;
use crate::provider::QuoteTransport;

/// Default upstream request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// [`QuoteTransport`] backed by a pooled `reqwest` client.
///
/// Connections are released when the transport is dropped.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests all fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                MarketDataError::unavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl QuoteTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, MarketDataError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::unavailable(format!(
                "HTTP error: {}",
                status
            )));
        }

        response.text().await.map_err(transport_error)
    }
}

fn transport_error(e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::unavailable(format!("Request timed out: {}", e))
    } else {
        MarketDataError::unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_unavailable() {
        let transport = HttpTransport::new(Duration::from_millis(500)).unwrap();

        // Port 9 (discard) on loopback is closed on any sane test host.
        let result = transport.get("http://127.0.0.1:9/iss/securities.json").await;

        assert!(matches!(
            result,
            Err(MarketDataError::UpstreamUnavailable { .. })
        ));
    }
}
