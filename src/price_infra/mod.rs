pub mod connectors;
pub mod orchestrator;
pub mod rotation;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    GoldApi,
    Yahoo,
    Stooq,
    Scrape,
    CoinGecko,
    CryptoCompare,
    DexScreener,
    Stream,
    Frankfurter,
    ErApi,
    ExchangeRateHost,
}

/// What shape of identifier a provider understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierKind {
    Symbol,
    Pair,
    Basket,
}

impl Provider {
    pub const ALL: [Provider; 11] = [
        Provider::GoldApi,
        Provider::Yahoo,
        Provider::Stooq,
        Provider::Scrape,
        Provider::CoinGecko,
        Provider::CryptoCompare,
        Provider::DexScreener,
        Provider::Stream,
        Provider::Frankfurter,
        Provider::ErApi,
        Provider::ExchangeRateHost,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Provider::GoldApi => "goldapi",
            Provider::Yahoo => "yahoo",
            Provider::Stooq => "stooq",
            Provider::Scrape => "scrape",
            Provider::CoinGecko => "coingecko",
            Provider::CryptoCompare => "cryptocompare",
            Provider::DexScreener => "dexscreener",
            Provider::Stream => "stream",
            Provider::Frankfurter => "frankfurter",
            Provider::ErApi => "erapi",
            Provider::ExchangeRateHost => "exchangeratehost",
        }
    }

    pub fn identifier_kind(&self) -> IdentifierKind {
        match self {
            Provider::GoldApi | Provider::Yahoo | Provider::Stooq | Provider::Scrape => {
                IdentifierKind::Symbol
            }
            Provider::CoinGecko
            | Provider::CryptoCompare
            | Provider::DexScreener
            | Provider::Stream => IdentifierKind::Basket,
            Provider::Frankfurter | Provider::ErApi | Provider::ExchangeRateHost => {
                IdentifierKind::Pair
            }
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.tag() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| Error::InvalidDescriptor {
                descriptor: s.to_string(),
                reason: "unknown provider".to_string(),
            })
    }
}

/// One entry of a basket: the symbol we cache under and the provider's own id for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasketEntry {
    pub symbol: String,
    pub provider_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    Symbol(String),
    Pair { base: String, quote: String },
    Basket(Vec<BasketEntry>),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Symbol(s) => f.write_str(s),
            Identifier::Pair { base, quote } => write!(f, "{base}/{quote}"),
            Identifier::Basket(entries) => {
                let joined = entries
                    .iter()
                    .map(|e| format!("{}={}", e.symbol, e.provider_id))
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&joined)
            }
        }
    }
}

/// A provider plus the provider-specific thing to ask it for.
///
/// Parsed once from the `provider:identifier` text form when configuration
/// is loaded, so adapters never re-inspect strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub provider: Provider,
    pub identifier: Identifier,
}

impl SourceDescriptor {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDescriptor {
            descriptor: raw.to_string(),
            reason: reason.to_string(),
        };

        let (tag, rest) = raw.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        let provider: Provider = tag.parse().map_err(|_| invalid("unknown provider"))?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(invalid("empty identifier"));
        }

        let identifier = match provider.identifier_kind() {
            IdentifierKind::Symbol => Identifier::Symbol(rest.to_string()),
            IdentifierKind::Pair => {
                let (base, quote) = rest
                    .split_once('/')
                    .ok_or_else(|| invalid("expected BASE/QUOTE"))?;
                let (base, quote) = (base.trim(), quote.trim());
                if base.is_empty() || quote.is_empty() {
                    return Err(invalid("expected BASE/QUOTE"));
                }
                Identifier::Pair {
                    base: base.to_ascii_uppercase(),
                    quote: quote.to_ascii_uppercase(),
                }
            }
            IdentifierKind::Basket => {
                let mut entries = Vec::new();
                for item in rest.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let (symbol, provider_id) = item
                        .split_once('=')
                        .ok_or_else(|| invalid("expected SYMBOL=id entries"))?;
                    if symbol.trim().is_empty() || provider_id.trim().is_empty() {
                        return Err(invalid("expected SYMBOL=id entries"));
                    }
                    entries.push(BasketEntry {
                        symbol: symbol.trim().to_ascii_uppercase(),
                        provider_id: provider_id.trim().to_string(),
                    });
                }
                if entries.is_empty() {
                    return Err(invalid("empty basket"));
                }
                if provider == Provider::DexScreener && entries.len() != 1 {
                    return Err(invalid("dexscreener resolves exactly one token"));
                }
                Identifier::Basket(entries)
            }
        };

        Ok(SourceDescriptor { provider, identifier })
    }

    /// Label stored as the record's `source`.
    pub fn label(&self) -> &'static str {
        self.provider.tag()
    }

    /// Symbols this descriptor writes when it is a basket.
    pub fn basket_symbols(&self) -> Vec<String> {
        match &self.identifier {
            Identifier::Basket(entries) => entries.iter().map(|e| e.symbol.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.identifier)
    }
}

impl FromStr for SourceDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SourceDescriptor::parse(s)
    }
}

/// Cache key for an FX pair.
pub fn fx_symbol(base: &str, quote: &str) -> String {
    format!("FX_{}_{}", base.to_ascii_uppercase(), quote.to_ascii_uppercase())
}
