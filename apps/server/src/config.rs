use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use moex_market_data::{MoexConfig, SchemaTemplate};
use moex_quote_cache::{CacheConfig, DEFAULT_ALERTS_KEY, DEFAULT_CACHE_KEY, DEFAULT_CACHE_TTL};

pub struct Config {
    pub listen_addr: SocketAddr,
    /// `None` keeps prices in-process instead of in Redis.
    pub redis_url: Option<String>,
    pub cache_key: String,
    pub cache_ttl: Duration,
    pub alerts_key: String,
    pub refresh_interval: Duration,
    pub iss_base_url: String,
    pub iss_board: String,
    pub reference_ticker: String,
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub cors_allow: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let moex = MoexConfig::default();
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8088)),
            redis_url: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            alerts_key: DEFAULT_ALERTS_KEY.to_string(),
            refresh_interval: Duration::from_secs(10),
            iss_base_url: moex.base_url,
            iss_board: moex.board,
            reference_ticker: moex.reference_ticker,
            upstream_timeout: moex.timeout,
            request_timeout: Duration::from_millis(30000),
            cors_allow: vec!["*".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = env_parse("MQ_LISTEN_ADDR", defaults.listen_addr)?;
        let redis_url = std::env::var("MQ_REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let cache_key = std::env::var("MQ_CACHE_KEY").unwrap_or(defaults.cache_key);
        let alerts_key = std::env::var("MQ_ALERTS_KEY").unwrap_or(defaults.alerts_key);
        let cache_ttl_secs = env_parse("MQ_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?;
        let refresh_secs = env_parse(
            "MQ_REFRESH_INTERVAL_SECS",
            defaults.refresh_interval.as_secs(),
        )?;
        let iss_base_url = std::env::var("MQ_ISS_BASE_URL").unwrap_or(defaults.iss_base_url);
        let iss_board = std::env::var("MQ_ISS_BOARD").unwrap_or(defaults.iss_board);
        let reference_ticker =
            std::env::var("MQ_REFERENCE_TICKER").unwrap_or(defaults.reference_ticker);
        let upstream_timeout_ms = env_parse(
            "MQ_UPSTREAM_TIMEOUT_MS",
            defaults.upstream_timeout.as_millis() as u64,
        )?;
        let request_timeout_ms = env_parse(
            "MQ_REQUEST_TIMEOUT_MS",
            defaults.request_timeout.as_millis() as u64,
        )?;
        let cors_allow = std::env::var("MQ_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Self {
            listen_addr,
            redis_url,
            cache_key,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            alerts_key,
            refresh_interval: Duration::from_secs(refresh_secs),
            iss_base_url,
            iss_board,
            reference_ticker,
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            cors_allow,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings under which a healthy pipeline could not keep fresh
    /// prices in the cache.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_ttl.is_zero() {
            anyhow::bail!("MQ_CACHE_TTL_SECS must be greater than zero");
        }
        if self.refresh_interval.is_zero() {
            anyhow::bail!("MQ_REFRESH_INTERVAL_SECS must be greater than zero");
        }
        if self.refresh_interval >= self.cache_ttl {
            anyhow::bail!(
                "MQ_REFRESH_INTERVAL_SECS ({}s) must be shorter than MQ_CACHE_TTL_SECS ({}s), \
                 or prices expire between refreshes",
                self.refresh_interval.as_secs(),
                self.cache_ttl.as_secs()
            );
        }
        if self.upstream_timeout.is_zero() {
            anyhow::bail!("MQ_UPSTREAM_TIMEOUT_MS must be greater than zero");
        }
        if self.request_timeout.is_zero() {
            anyhow::bail!("MQ_REQUEST_TIMEOUT_MS must be greater than zero");
        }
        if self.cache_key == self.alerts_key {
            anyhow::bail!("MQ_CACHE_KEY and MQ_ALERTS_KEY must differ");
        }
        Ok(())
    }

    pub fn moex_config(&self) -> MoexConfig {
        MoexConfig {
            base_url: self.iss_base_url.clone(),
            board: self.iss_board.clone(),
            reference_ticker: self.reference_ticker.clone(),
            timeout: self.upstream_timeout,
            schema: SchemaTemplate::moex_shares(),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache_key.clone(), self.cache_ttl)
    }
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
