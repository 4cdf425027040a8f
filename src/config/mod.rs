use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod loader;
pub mod sources;

pub use loader::AppConfig;
pub use sources::SourceRegistry;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Admin endpoints are disabled when unset.
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
            admin_token: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            path: PathBuf::from("data/price-cache.json"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Optional JSON file replacing the default source lists group by group.
    pub override_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub spot_interval_secs: u64,
    pub fx_interval_secs: u64,
    pub metals_interval_secs: u64,
    pub energy_interval_secs: u64,
}

impl ScheduleConfig {
    pub fn spot_interval(&self) -> Duration {
        Duration::from_secs(self.spot_interval_secs.max(1))
    }

    pub fn fx_interval(&self) -> Duration {
        Duration::from_secs(self.fx_interval_secs.max(1))
    }

    pub fn metals_interval(&self) -> Duration {
        Duration::from_secs(self.metals_interval_secs.max(1))
    }

    pub fn energy_interval(&self) -> Duration {
        Duration::from_secs(self.energy_interval_secs.max(1))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            spot_interval_secs: 60,
            fx_interval_secs: 600,      // 10 minutes
            metals_interval_secs: 1800, // 30 minutes
            energy_interval_secs: 3600, // 1 hour
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub retry_delay_ms: u64,
    pub max_retries: u32,
    pub user_agent: String,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            retry_delay_ms: 750,
            max_retries: 1,
            user_agent: "Mozilla/5.0 (compatible; PriceRelay/0.1)".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Credentials {
    pub goldapi_key: Option<String>,
    pub exchangerate_host_key: Option<String>,
}

/// Base URLs per provider. Overridden in tests to point at a mock server.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    pub goldapi: String,
    pub yahoo: String,
    pub stooq: String,
    pub coingecko: String,
    pub cryptocompare: String,
    pub dexscreener: String,
    pub frankfurter: String,
    pub erapi: String,
    pub exchangerate_host: String,
    pub binance_ws: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        ProviderEndpoints {
            goldapi: "https://www.goldapi.io".to_string(),
            yahoo: "https://query1.finance.yahoo.com".to_string(),
            stooq: "https://stooq.com".to_string(),
            coingecko: "https://api.coingecko.com".to_string(),
            cryptocompare: "https://min-api.cryptocompare.com".to_string(),
            dexscreener: "https://api.dexscreener.com".to_string(),
            frankfurter: "https://api.frankfurter.app".to_string(),
            erapi: "https://open.er-api.com".to_string(),
            exchangerate_host: "https://api.exchangerate.host".to_string(),
            binance_ws: "wss://stream.binance.com:9443".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub enabled: bool,
    pub symbols: Vec<String>,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            enabled: true,
            symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "SOLUSDT".to_string(),
            ],
            backoff_base_ms: 1_000,
            backoff_max_ms: 60_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Fixed secondary source tried when silver's rotated source yields nothing.
    pub silver: String,
    /// Last-resort scrape for metals; `{name}` is the lowercase sub-symbol.
    pub metals_template: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            silver: "scrape:https://www.kitco.com/charts/silver#Bid".to_string(),
            metals_template: "scrape:https://markets.businessinsider.com/commodities/{name}-price#{name}"
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `pretty` or `json`.
    pub format: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            format: "pretty".to_string(),
            level: "info".to_string(),
        }
    }
}
