pub mod binance;
pub mod crypto;
pub mod fx;
pub mod http;
pub mod parse;
pub mod spot;

use async_trait::async_trait;

use crate::config::{Credentials, FetchConfig, ProviderEndpoints};
use crate::error::{Error, Result};
use crate::price_infra::connectors::http::HttpClient;
use crate::price_infra::{BasketEntry, Identifier, Provider, SourceDescriptor};

/// Network side of the adapters, as seen by orchestrators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// One price for a `Symbol` or `Pair` descriptor.
    async fn fetch_price(&self, source: &SourceDescriptor) -> Result<f64>;

    /// Prices for the basket entries the provider could resolve, keyed by our symbol.
    async fn fetch_basket(&self, source: &SourceDescriptor) -> Result<Vec<(String, f64)>>;
}

/// Dispatches descriptors to the provider adapters.
pub struct SourceAdapters {
    http: HttpClient,
    endpoints: ProviderEndpoints,
    credentials: Credentials,
}

impl SourceAdapters {
    pub fn new(
        fetch: &FetchConfig,
        endpoints: ProviderEndpoints,
        credentials: Credentials,
    ) -> Result<Self> {
        Ok(SourceAdapters {
            http: HttpClient::new(fetch)?,
            endpoints,
            credentials,
        })
    }

    fn credential(value: &Option<String>, name: &'static str) -> Result<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(Error::MissingCredential(name))
    }
}

#[async_trait]
impl PriceFetcher for SourceAdapters {
    async fn fetch_price(&self, source: &SourceDescriptor) -> Result<f64> {
        let unsupported = Error::UnsupportedIdentifier {
            provider: source.provider.tag(),
            requested: "a single price",
        };

        match (&source.provider, &source.identifier) {
            (Provider::GoldApi, Identifier::Symbol(symbol)) => {
                let key = Self::credential(&self.credentials.goldapi_key, "goldapi_key")?;
                spot::goldapi(&self.http, &self.endpoints.goldapi, &key, symbol).await
            }
            (Provider::Yahoo, Identifier::Symbol(symbol)) => {
                spot::yahoo(&self.http, &self.endpoints.yahoo, symbol).await
            }
            (Provider::Stooq, Identifier::Symbol(symbol)) => {
                spot::stooq(&self.http, &self.endpoints.stooq, symbol).await
            }
            (Provider::Scrape, Identifier::Symbol(target)) => spot::scrape(&self.http, target).await,
            (Provider::Frankfurter, Identifier::Pair { base, quote }) => {
                fx::frankfurter(&self.http, &self.endpoints.frankfurter, base, quote).await
            }
            (Provider::ErApi, Identifier::Pair { base, quote }) => {
                fx::erapi(&self.http, &self.endpoints.erapi, base, quote).await
            }
            (Provider::ExchangeRateHost, Identifier::Pair { base, quote }) => {
                let key = Self::credential(
                    &self.credentials.exchangerate_host_key,
                    "exchangerate_host_key",
                )?;
                fx::exchangerate_host(&self.http, &self.endpoints.exchangerate_host, &key, base, quote)
                    .await
            }
            (
                Provider::GoldApi
                | Provider::Yahoo
                | Provider::Stooq
                | Provider::Scrape
                | Provider::Frankfurter
                | Provider::ErApi
                | Provider::ExchangeRateHost
                | Provider::CoinGecko
                | Provider::CryptoCompare
                | Provider::DexScreener
                | Provider::Stream,
                _,
            ) => Err(unsupported),
        }
    }

    async fn fetch_basket(&self, source: &SourceDescriptor) -> Result<Vec<(String, f64)>> {
        let entries: &[BasketEntry] = match &source.identifier {
            Identifier::Basket(entries) => entries,
            Identifier::Symbol(_) | Identifier::Pair { .. } => {
                return Err(Error::UnsupportedIdentifier {
                    provider: source.provider.tag(),
                    requested: "a basket",
                });
            }
        };

        match source.provider {
            Provider::CoinGecko => crypto::coingecko(&self.http, &self.endpoints.coingecko, entries).await,
            Provider::CryptoCompare => {
                crypto::cryptocompare(&self.http, &self.endpoints.cryptocompare, entries).await
            }
            Provider::DexScreener => {
                crypto::dexscreener(&self.http, &self.endpoints.dexscreener, entries).await
            }
            // the streaming table is read by the orchestrator, never over HTTP
            Provider::Stream
            | Provider::GoldApi
            | Provider::Yahoo
            | Provider::Stooq
            | Provider::Scrape
            | Provider::Frankfurter
            | Provider::ErApi
            | Provider::ExchangeRateHost => Err(Error::UnsupportedIdentifier {
                provider: source.provider.tag(),
                requested: "a basket over HTTP",
            }),
        }
    }
}
