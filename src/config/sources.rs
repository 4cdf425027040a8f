use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::price_infra::{IdentifierKind, Identifier, SourceDescriptor, fx_symbol};
use crate::types::Group;

const DEFAULT_GOLD: &[&str] = &["goldapi:XAU", "yahoo:GC=F", "stooq:xauusd"];
const DEFAULT_SILVER: &[&str] = &["goldapi:XAG", "yahoo:SI=F", "stooq:xagusd"];
const DEFAULT_CRYPTO: &[&str] = &[
    "stream:BTC=BTCUSDT,ETH=ETHUSDT,SOL=SOLUSDT",
    "coingecko:BTC=bitcoin,ETH=ethereum,SOL=solana",
    "cryptocompare:BTC=BTC,ETH=ETH,SOL=SOL",
    "dexscreener:PEPE=0x6982508145454Ce325dDbE47a25d4ec3d2311933",
];
const DEFAULT_FX: &[&str] = &[
    "frankfurter:USD/EUR",
    "erapi:USD/EUR",
    "exchangeratehost:USD/EUR",
];
const DEFAULT_METALS: &[(&str, &[&str])] = &[
    ("PLATINUM", &["yahoo:PL=F", "stooq:xptusd"]),
    ("PALLADIUM", &["yahoo:PA=F", "stooq:xpdusd"]),
    ("COPPER", &["yahoo:HG=F", "stooq:hg.f"]),
];
const DEFAULT_ENERGY: &[(&str, &[&str])] = &[
    ("WTI", &["yahoo:CL=F", "stooq:cl.f"]),
    ("BRENT", &["yahoo:BZ=F", "stooq:cb.f"]),
    ("NATGAS", &["yahoo:NG=F", "stooq:ng.f"]),
];

/// Ordered sources for one sub-symbol of a nested group.
#[derive(Clone, Debug, PartialEq)]
pub struct SubSymbolSources {
    pub symbol: String,
    pub sources: Vec<SourceDescriptor>,
}

/// Shape of the optional override file. Every key is optional; a present key
/// replaces that group's defaults wholesale.
#[derive(Debug, Default, Deserialize)]
struct RawSources {
    gold: Option<Vec<String>>,
    silver: Option<Vec<String>>,
    crypto: Option<Vec<String>>,
    fx: Option<Vec<String>>,
    metals: Option<BTreeMap<String, Vec<String>>>,
    energy: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Clone, Debug, Default)]
pub struct SourceRegistry {
    rotated: HashMap<Group, Vec<SourceDescriptor>>,
    nested: HashMap<Group, Vec<SubSymbolSources>>,
}

impl SourceRegistry {
    pub fn with_defaults() -> Result<Self> {
        Self::from_raw(RawSources::default())
    }

    /// Defaults, overridden by `path` when given. The file is read once.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::with_defaults();
        };
        let text = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&text)?;
        tracing::info!("Loaded source overrides from {:?}", path);
        Ok(registry)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawSources = serde_json::from_str(text)
            .map_err(|e| Error::ConfigError(format!("invalid source override: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSources) -> Result<Self> {
        let mut registry = SourceRegistry::default();

        let flat = [
            (Group::Gold, raw.gold, DEFAULT_GOLD),
            (Group::Silver, raw.silver, DEFAULT_SILVER),
            (Group::Crypto, raw.crypto, DEFAULT_CRYPTO),
            (Group::Fx, raw.fx, DEFAULT_FX),
        ];
        for (group, overridden, defaults) in flat {
            let list = match overridden {
                Some(list) => parse_list(group, list.as_slice())?,
                None => parse_list(group, defaults)?,
            };
            registry.rotated.insert(group, list);
        }

        let nested = [
            (Group::Metals, raw.metals, DEFAULT_METALS),
            (Group::Energy, raw.energy, DEFAULT_ENERGY),
        ];
        for (group, overridden, defaults) in nested {
            let subs = match overridden {
                Some(map) => map
                    .into_iter()
                    .map(|(symbol, list)| sub_symbol(group, &symbol, list.as_slice()))
                    .collect::<Result<Vec<_>>>()?,
                None => defaults
                    .iter()
                    .map(|&(symbol, list)| sub_symbol(group, symbol, list))
                    .collect::<Result<Vec<_>>>()?,
            };
            registry.nested.insert(group, subs);
        }

        Ok(registry)
    }

    pub fn set_sources(&mut self, group: Group, sources: Vec<SourceDescriptor>) {
        self.rotated.insert(group, sources);
    }

    pub fn set_sub_symbols(&mut self, group: Group, subs: Vec<SubSymbolSources>) {
        self.nested.insert(group, subs);
    }

    /// Rotation list for a flat group, `None` when absent or empty.
    pub fn sources(&self, group: Group) -> Option<&[SourceDescriptor]> {
        self.rotated
            .get(&group)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    pub fn sub_symbols(&self, group: Group) -> &[SubSymbolSources] {
        self.nested.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols the read API lists for a group when the caller names none.
    pub fn default_symbols(&self, group: Group) -> Vec<String> {
        let mut symbols: Vec<String> = match group {
            Group::Gold => vec!["GOLD".to_string()],
            Group::Silver => vec!["SILVER".to_string()],
            Group::Crypto => self
                .sources(group)
                .unwrap_or(&[])
                .iter()
                .flat_map(SourceDescriptor::basket_symbols)
                .collect(),
            Group::Fx => self
                .sources(group)
                .unwrap_or(&[])
                .iter()
                .filter_map(|d| match &d.identifier {
                    Identifier::Pair { base, quote } => Some(fx_symbol(base, quote)),
                    _ => None,
                })
                .collect(),
            Group::Metals | Group::Energy => self
                .sub_symbols(group)
                .iter()
                .map(|s| s.symbol.clone())
                .collect(),
        };
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

fn expected_kind(group: Group) -> IdentifierKind {
    match group {
        Group::Crypto => IdentifierKind::Basket,
        Group::Fx => IdentifierKind::Pair,
        Group::Gold | Group::Silver | Group::Metals | Group::Energy => IdentifierKind::Symbol,
    }
}

fn parse_for_group<S: AsRef<str>>(group: Group, raw: S) -> Result<SourceDescriptor> {
    let descriptor = SourceDescriptor::parse(raw.as_ref())?;
    if descriptor.provider.identifier_kind() != expected_kind(group) {
        return Err(Error::InvalidDescriptor {
            descriptor: raw.as_ref().to_string(),
            reason: format!("provider {} does not serve group {}", descriptor.provider, group),
        });
    }
    Ok(descriptor)
}

fn parse_list<S: AsRef<str>>(group: Group, list: &[S]) -> Result<Vec<SourceDescriptor>> {
    list.iter().map(|raw| parse_for_group(group, raw)).collect()
}

fn sub_symbol<S: AsRef<str>>(group: Group, symbol: &str, list: &[S]) -> Result<SubSymbolSources> {
    Ok(SubSymbolSources {
        symbol: symbol.trim().to_ascii_uppercase(),
        sources: parse_list(group, list)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::Provider;

    #[test]
    fn defaults_cover_every_group() {
        let registry = SourceRegistry::with_defaults().unwrap();
        assert_eq!(registry.sources(Group::Gold).unwrap().len(), 3);
        assert_eq!(registry.sources(Group::Fx).unwrap().len(), 3);
        assert!(registry.sources(Group::Metals).is_none());
        assert_eq!(registry.sub_symbols(Group::Energy).len(), 3);
        assert_eq!(registry.default_symbols(Group::Fx), vec!["FX_USD_EUR"]);
        assert!(registry.default_symbols(Group::Crypto).contains(&"PEPE".to_string()));
    }

    #[test]
    fn override_replaces_only_named_groups() {
        let registry = SourceRegistry::from_json(
            r#"{"gold": ["stooq:xauusd"], "metals": {"platinum": ["yahoo:PL=F"]}}"#,
        )
        .unwrap();

        let gold = registry.sources(Group::Gold).unwrap();
        assert_eq!(gold.len(), 1);
        assert_eq!(gold[0].provider, Provider::Stooq);
        assert_eq!(registry.sources(Group::Silver).unwrap().len(), 3);

        let metals = registry.sub_symbols(Group::Metals);
        assert_eq!(metals.len(), 1);
        assert_eq!(metals[0].symbol, "PLATINUM");
    }

    #[test]
    fn empty_list_reads_as_absent() {
        let registry = SourceRegistry::from_json(r#"{"fx": []}"#).unwrap();
        assert!(registry.sources(Group::Fx).is_none());
    }

    #[test]
    fn rejects_provider_in_wrong_group() {
        assert!(SourceRegistry::from_json(r#"{"fx": ["yahoo:EURUSD=X"]}"#).is_err());
        assert!(SourceRegistry::from_json(r#"{"gold": ["coingecko:GOLD=pax-gold"]}"#).is_err());
        assert!(SourceRegistry::from_json("not json").is_err());
    }
}
