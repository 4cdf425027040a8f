//! Multi-symbol crypto aggregators and the single-token DEX lookup.

use reqwest::header::HeaderMap;

use crate::error::{Error, Result};
use crate::price_infra::BasketEntry;
use crate::price_infra::connectors::http::HttpClient;
use crate::price_infra::connectors::parse::price_at;

pub async fn coingecko(http: &HttpClient, base: &str, entries: &[BasketEntry]) -> Result<Vec<(String, f64)>> {
    let ids = join_ids(entries);
    let url = format!(
        "{}/api/v3/simple/price?ids={}&vs_currencies=usd",
        base.trim_end_matches('/'),
        ids
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    collect(entries, "coingecko", |id| price_at(&body, &format!("/{id}/usd"), "coingecko"))
}

pub async fn cryptocompare(
    http: &HttpClient,
    base: &str,
    entries: &[BasketEntry],
) -> Result<Vec<(String, f64)>> {
    let ids = join_ids(entries);
    let url = format!(
        "{}/data/pricemulti?fsyms={}&tsyms=USD",
        base.trim_end_matches('/'),
        ids
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    collect(entries, "cryptocompare", |id| {
        price_at(&body, &format!("/{id}/USD"), "cryptocompare")
    })
}

/// DexScreener token lookup; the first listed pair carries the price.
pub async fn dexscreener(
    http: &HttpClient,
    base: &str,
    entries: &[BasketEntry],
) -> Result<Vec<(String, f64)>> {
    let entry = entries
        .first()
        .ok_or_else(|| Error::ConfigError("empty dexscreener basket".into()))?;
    let url = format!(
        "{}/latest/dex/tokens/{}",
        base.trim_end_matches('/'),
        entry.provider_id
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    let price = price_at(&body, "/pairs/0/priceUsd", "dexscreener")?;
    Ok(vec![(entry.symbol.clone(), price)])
}

fn join_ids(entries: &[BasketEntry]) -> String {
    entries
        .iter()
        .map(|e| e.provider_id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Keep whatever resolved; fail only when nothing did.
fn collect<F>(entries: &[BasketEntry], provider: &'static str, mut lookup: F) -> Result<Vec<(String, f64)>>
where
    F: FnMut(&str) -> Result<f64>,
{
    let mut resolved = Vec::with_capacity(entries.len());
    let mut last_error = None;

    for entry in entries {
        match lookup(&entry.provider_id) {
            Ok(price) => resolved.push((entry.symbol.clone(), price)),
            Err(e) => {
                tracing::debug!(provider, symbol = %entry.symbol, error = %e, "Basket entry unresolved");
                last_error = Some(e);
            }
        }
    }

    if resolved.is_empty() {
        return Err(last_error.unwrap_or_else(|| Error::PatternNotFound(provider.to_string())));
    }
    Ok(resolved)
}
