use std::sync::Arc;

use crate::config::Config;
use moex_market_data::{MoexClient, QuoteSource};
use moex_quote_cache::{AlertStore, KeyValueStore, MemoryStore, QuoteCache, RedisStore};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub quote_source: Arc<dyn QuoteSource>,
    pub quote_cache: Arc<QuoteCache>,
    pub alert_store: Arc<AlertStore>,
}

impl AppState {
    pub fn new(
        quote_source: Arc<dyn QuoteSource>,
        quote_cache: Arc<QuoteCache>,
        alert_store: Arc<AlertStore>,
    ) -> Self {
        Self {
            quote_source,
            quote_cache,
            alert_store,
        }
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("MQ_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => {
            tracing::warn!("MQ_REDIS_URL not set; prices are cached in-process only");
            Arc::new(MemoryStore::new())
        }
    };
    let quote_cache = Arc::new(QuoteCache::new(store.clone(), config.cache_config()));
    let alert_store = Arc::new(AlertStore::new(store, config.alerts_key.clone()));

    let moex = config.moex_config();
    tracing::info!(
        "Quote source: {} board {} (probe ticker {})",
        moex.base_url,
        moex.board,
        moex.reference_ticker
    );
    let quote_source: Arc<dyn QuoteSource> = Arc::new(MoexClient::new(moex)?);

    Ok(Arc::new(AppState::new(
        quote_source,
        quote_cache,
        alert_store,
    )))
}
