//! Moscow Exchange (ISS) quote source.
//!
//! A fetch cycle is two requests against the ISS JSON API:
//!
//! - Liveness probe: `{base}/engines/stock/markets/shares/boards/{board}/securities/{ticker}.json?iss.meta=off&iss.only=marketdata&marketdata.columns=SECID,LAST`
//! - Snapshot: `{base}/engines/stock/markets/shares/boards/{board}/securities.json?iss.meta=off`
//!
//! The snapshot is only requested after the probe succeeds, and is rejected
//! outright if its column layout differs from the configured
//! [`SchemaTemplate`].

mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info};

use crate::errors::MarketDataError;
use crate::models::{QuoteMap, Snapshot};
use crate::provider::http::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
use crate::provider::{QuoteSource, QuoteTransport};
use crate::schema::SchemaTemplate;

use models::{MarketDataResponse, SecuritiesResponse};

const PROVIDER_ID: &str = "MOEX";

/// Public ISS endpoint
pub const DEFAULT_BASE_URL: &str = "https://iss.moex.com/iss";

/// Main T+ shares board
pub const DEFAULT_BOARD: &str = "TQBR";

/// Instrument used for the liveness probe
pub const DEFAULT_REFERENCE_TICKER: &str = "SBER";

/// Connection settings for the ISS API.
#[derive(Clone, Debug)]
pub struct MoexConfig {
    /// ISS root, without trailing slash
    pub base_url: String,

    /// Board whose securities are fetched
    pub board: String,

    /// Ticker the liveness probe asks for
    pub reference_ticker: String,

    /// Upper bound for each request
    pub timeout: Duration,

    /// Expected securities layout
    pub schema: SchemaTemplate,
}

impl Default for MoexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            board: DEFAULT_BOARD.to_string(),
            reference_ticker: DEFAULT_REFERENCE_TICKER.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            schema: SchemaTemplate::moex_shares(),
        }
    }
}

impl MoexConfig {
    fn board_url(&self) -> String {
        format!(
            "{}/engines/stock/markets/shares/boards/{}",
            self.base_url.trim_end_matches('/'),
            self.board
        )
    }

    /// URL of the single-instrument liveness probe.
    pub fn probe_url(&self) -> String {
        format!(
            "{}/securities/{}.json?iss.meta=off&iss.only=marketdata&marketdata.columns=SECID,LAST",
            self.board_url(),
            self.reference_ticker
        )
    }

    /// URL of the board-wide securities table.
    pub fn securities_url(&self) -> String {
        format!("{}/securities.json?iss.meta=off", self.board_url())
    }
}

/// Client for the Moscow Exchange ISS API.
///
/// # Example
///
/// ```ignore
/// let client = MoexClient::new(MoexConfig::default())?;
/// let quotes = client.fetch_quotes().await?;
/// ```
pub struct MoexClient {
    transport: Arc<dyn QuoteTransport>,
    config: MoexConfig,
}

impl MoexClient {
    /// Create a client that talks HTTP with `config.timeout` per request.
    pub fn new(config: MoexConfig) -> Result<Self, MarketDataError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: MoexConfig, transport: Arc<dyn QuoteTransport>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &MoexConfig {
        &self.config
    }

    /// Open a fetch session. The session owns the snapshot of one cycle and
    /// releases it when dropped, whether or not the cycle succeeded. The
    /// transport and its connection pool stay with the client across sessions.
    pub fn session(&self) -> SnapshotSession<'_> {
        SnapshotSession {
            client: self,
            snapshot: None,
        }
    }

    /// Request the reference instrument and check the answer is sane.
    pub async fn probe_liveness(&self) -> Result<f64, MarketDataError> {
        let expected = self.config.reference_ticker.as_str();
        let body = self
            .transport
            .get(&self.config.probe_url())
            .await
            .map_err(|e| {
                error!("{} probe request failed: {}", PROVIDER_ID, e);
                e
            })?;

        let response: MarketDataResponse = serde_json::from_str(&body).map_err(|e| {
            error!("{} probe returned unparsable body: {}", PROVIDER_ID, e);
            MarketDataError::malformed(format!("Failed to parse probe response: {}", e))
        })?;

        let row = response.marketdata.data.into_iter().next().ok_or_else(|| {
            error!("{} probe returned no market data rows", PROVIDER_ID);
            MarketDataError::malformed("No market data rows in probe response")
        })?;

        let (ticker, price) = match row.as_slice() {
            [ticker, price, ..] => (ticker, price),
            _ => {
                error!("{} probe row is too short: {:?}", PROVIDER_ID, row);
                return Err(MarketDataError::malformed(
                    "Probe row has fewer than two columns",
                ));
            }
        };

        if ticker.as_str() != Some(expected) {
            let actual = ticker
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| ticker.to_string());
            error!(
                "{} probe answered for {} (expected {})",
                PROVIDER_ID, actual, expected
            );
            return Err(MarketDataError::UnexpectedTicker {
                expected: expected.to_string(),
                actual,
            });
        }

        let price = price.as_f64().filter(|p| p.is_finite()).ok_or_else(|| {
            error!("{} probe returned invalid price: {}", PROVIDER_ID, price);
            MarketDataError::InvalidPrice {
                ticker: expected.to_string(),
                value: price.to_string(),
            }
        })?;

        info!("{} is alive: {} = {}", PROVIDER_ID, expected, price);
        Ok(price)
    }
}

#[async_trait]
impl QuoteSource for MoexClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn probe_liveness(&self) -> Result<f64, MarketDataError> {
        MoexClient::probe_liveness(self).await
    }

    async fn fetch_quotes(&self) -> Result<QuoteMap, MarketDataError> {
        let mut session = self.session();
        session.fetch_snapshot().await?;
        session.extract_quotes()
    }
}

/// State of a single fetch cycle.
pub struct SnapshotSession<'a> {
    client: &'a MoexClient,
    snapshot: Option<Snapshot>,
}

impl SnapshotSession<'_> {
    pub async fn probe_liveness(&self) -> Result<f64, MarketDataError> {
        self.client.probe_liveness().await
    }

    /// Probe, then fetch and schema-check the full securities table.
    ///
    /// The table request is never issued if the probe fails. On success the
    /// snapshot replaces any previous one held by this session.
    pub async fn fetch_snapshot(&mut self) -> Result<(), MarketDataError> {
        self.client.probe_liveness().await?;

        let config = &self.client.config;
        let body = self
            .client
            .transport
            .get(&config.securities_url())
            .await
            .map_err(|e| {
                error!("{} securities request failed: {}", PROVIDER_ID, e);
                e
            })?;

        let response: SecuritiesResponse = serde_json::from_str(&body).map_err(|e| {
            error!("{} securities body is malformed: {}", PROVIDER_ID, e);
            MarketDataError::malformed(format!("Failed to parse securities response: {}", e))
        })?;

        if let Err(e) = config.schema.verify(&response.securities.columns) {
            error!(
                "{} securities layout changed ({}); expected template {:?}",
                PROVIDER_ID,
                e,
                config.schema.columns()
            );
            return Err(e);
        }

        let snapshot = Snapshot {
            columns: response.securities.columns,
            rows: response.securities.data,
            fetched_at: Utc::now(),
        };
        info!(
            "{} snapshot received: {} securities on {}",
            PROVIDER_ID,
            snapshot.len(),
            config.board
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Ticker→price mapping of the fetched snapshot.
    pub fn extract_quotes(&self) -> Result<QuoteMap, MarketDataError> {
        let snapshot = self.snapshot.as_ref().ok_or(MarketDataError::NoSnapshot)?;
        let quotes = snapshot.extract_quotes(&self.client.config.schema);
        debug!(
            "Extracted {} quotes from {} rows",
            quotes.len(),
            snapshot.len()
        );
        Ok(quotes)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MOEX_SHARES_COLUMNS;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // =========================================================================
    // Scripted transport
    // =========================================================================

    enum Reply {
        Body(String),
        Unavailable,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<HashMap<String, Reply>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn reply(self, url: String, body: serde_json::Value) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(url, Reply::Body(body.to_string()));
            self
        }

        fn reply_raw(self, url: String, body: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(url, Reply::Body(body.to_string()));
            self
        }

        fn fail(self, url: String) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(url, Reply::Unavailable);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<String, MarketDataError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.replies.lock().unwrap().get(url) {
                Some(Reply::Body(body)) => Ok(body.clone()),
                Some(Reply::Unavailable) => {
                    Err(MarketDataError::unavailable("Request timed out"))
                }
                None => Err(MarketDataError::unavailable("HTTP error: 404 Not Found")),
            }
        }
    }

    fn config() -> MoexConfig {
        MoexConfig {
            base_url: "http://iss.test/iss".to_string(),
            ..MoexConfig::default()
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> MoexClient {
        MoexClient::with_transport(config(), transport)
    }

    fn sber_probe() -> serde_json::Value {
        json!({"marketdata": {"data": [["SBER", 250.50]]}})
    }

    fn securities(columns: Vec<String>) -> serde_json::Value {
        json!({
            "securities": {
                "columns": columns,
                "data": [
                    ["SBER", "TQBR", "Сбербанк", 250.50, 10, 1],
                    ["GAZP", "TQBR", "Газпром", 180.75, 10, 1]
                ]
            }
        })
    }

    fn template_columns() -> Vec<String> {
        MOEX_SHARES_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    // =========================================================================
    // URLs
    // =========================================================================

    #[test]
    fn test_urls() {
        let config = MoexConfig::default();
        assert_eq!(
            config.probe_url(),
            "https://iss.moex.com/iss/engines/stock/markets/shares/boards/TQBR/securities/SBER.json?iss.meta=off&iss.only=marketdata&marketdata.columns=SECID,LAST"
        );
        assert_eq!(
            config.securities_url(),
            "https://iss.moex.com/iss/engines/stock/markets/shares/boards/TQBR/securities.json?iss.meta=off"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let config = MoexConfig {
            base_url: "http://iss.test/iss/".to_string(),
            ..MoexConfig::default()
        };
        assert!(config
            .securities_url()
            .starts_with("http://iss.test/iss/engines/"));
    }

    // =========================================================================
    // Liveness probe
    // =========================================================================

    #[tokio::test]
    async fn test_probe_returns_reference_price() {
        let transport =
            Arc::new(ScriptedTransport::default().reply(config().probe_url(), sber_probe()));

        let price = client(transport).probe_liveness().await.unwrap();
        assert_eq!(price, 250.50);
    }

    #[tokio::test]
    async fn test_probe_rejects_other_ticker() {
        let transport = Arc::new(ScriptedTransport::default().reply(
            config().probe_url(),
            json!({"marketdata": {"data": [["GAZP", 180.75]]}}),
        ));

        let err = client(transport).probe_liveness().await.unwrap_err();
        match err {
            MarketDataError::UnexpectedTicker { expected, actual } => {
                assert_eq!(expected, "SBER");
                assert_eq!(actual, "GAZP");
            }
            other => panic!("expected UnexpectedTicker, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_rejects_null_price() {
        let transport = Arc::new(ScriptedTransport::default().reply(
            config().probe_url(),
            json!({"marketdata": {"data": [["SBER", null]]}}),
        ));

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidPrice { .. }));
    }

    #[tokio::test]
    async fn test_probe_rejects_string_price() {
        let transport = Arc::new(ScriptedTransport::default().reply(
            config().probe_url(),
            json!({"marketdata": {"data": [["SBER", "250.50"]]}}),
        ));

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidPrice { .. }));
    }

    #[tokio::test]
    async fn test_probe_rejects_empty_data() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), json!({"marketdata": {"data": []}})),
        );

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_probe_rejects_short_row() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), json!({"marketdata": {"data": [["SBER"]]}})),
        );

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_probe_rejects_invalid_json() {
        let transport = Arc::new(
            ScriptedTransport::default().reply_raw(config().probe_url(), "<html>maintenance</html>"),
        );

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_probe_transport_failure_is_upstream_unavailable() {
        let transport = Arc::new(ScriptedTransport::default().fail(config().probe_url()));

        let err = client(transport).probe_liveness().await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamUnavailable { .. }));
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    #[tokio::test]
    async fn test_fetch_snapshot_probes_first() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .reply(config().securities_url(), securities(template_columns())),
        );
        let client = client(transport.clone());

        let mut session = client.session();
        session.fetch_snapshot().await.unwrap();

        assert_eq!(
            transport.requested(),
            vec![config().probe_url(), config().securities_url()]
        );
        assert_eq!(session.snapshot().map(Snapshot::len), Some(2));
    }

    #[tokio::test]
    async fn test_failed_probe_skips_snapshot_request() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .fail(config().probe_url())
                .reply(config().securities_url(), securities(template_columns())),
        );
        let client = client(transport.clone());

        let mut session = client.session();
        let err = session.fetch_snapshot().await.unwrap_err();

        assert!(matches!(err, MarketDataError::UpstreamUnavailable { .. }));
        assert_eq!(transport.requested(), vec![config().probe_url()]);
        assert!(session.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_wrong_probe_ticker_skips_snapshot_request() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(
                    config().probe_url(),
                    json!({"marketdata": {"data": [["GAZP", 180.75]]}}),
                )
                .reply(config().securities_url(), securities(template_columns())),
        );
        let client = client(transport.clone());

        let err = client.fetch_quotes().await.unwrap_err();

        assert!(matches!(err, MarketDataError::UnexpectedTicker { .. }));
        assert_eq!(transport.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_drift_fails_snapshot() {
        let mut renamed = template_columns();
        renamed[3] = "LAST".to_string();
        let mut added = template_columns();
        added.push("NEWCOL".to_string());
        let mut removed = template_columns();
        removed.pop();
        let mut reordered = template_columns();
        reordered.swap(0, 1);

        for columns in [renamed, added, removed, reordered] {
            let transport = Arc::new(
                ScriptedTransport::default()
                    .reply(config().probe_url(), sber_probe())
                    .reply(config().securities_url(), securities(columns)),
            );
            let client = client(transport);

            let mut session = client.session();
            let err = session.fetch_snapshot().await.unwrap_err();

            assert!(matches!(err, MarketDataError::SchemaDrift { .. }));
            assert!(session.snapshot().is_none());
        }
    }

    #[tokio::test]
    async fn test_snapshot_without_securities_block_is_malformed() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .reply(config().securities_url(), json!({"marketdata": {"data": []}})),
        );

        let err = client(transport).fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_transport_failure_is_upstream_unavailable() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .fail(config().securities_url()),
        );

        let err = client(transport).fetch_quotes().await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamUnavailable { .. }));
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    #[tokio::test]
    async fn test_extract_quotes_from_snapshot() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .reply(config().securities_url(), securities(template_columns())),
        );
        let client = client(transport);

        let mut session = client.session();
        session.fetch_snapshot().await.unwrap();
        let quotes = session.extract_quotes().unwrap();

        let expected: QuoteMap = [("SBER".to_string(), 250.50), ("GAZP".to_string(), 180.75)]
            .into_iter()
            .collect();
        assert_eq!(quotes, expected);
    }

    #[tokio::test]
    async fn test_fetch_quotes_runs_full_cycle() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .reply(config().securities_url(), securities(template_columns())),
        );

        let quotes = client(transport).fetch_quotes().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["GAZP"], 180.75);
    }

    #[tokio::test]
    async fn test_empty_board_yields_empty_quotes() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(config().probe_url(), sber_probe())
                .reply(
                    config().securities_url(),
                    json!({"securities": {"columns": template_columns(), "data": []}}),
                ),
        );

        let quotes = client(transport).fetch_quotes().await.unwrap();
        assert!(quotes.is_empty());
    }

    #[test]
    fn test_extract_before_fetch_fails() {
        let client = client(Arc::new(ScriptedTransport::default()));
        let session = client.session();

        assert!(matches!(
            session.extract_quotes(),
            Err(MarketDataError::NoSnapshot)
        ));
    }

    #[test]
    fn test_source_id() {
        let client = client(Arc::new(ScriptedTransport::default()));
        assert_eq!(QuoteSource::id(&client), "MOEX");
    }
}
