//! Metals and energy adapters: structured APIs and scraped pages.

use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::{Error, Result};
use crate::price_infra::connectors::http::HttpClient;
use crate::price_infra::connectors::parse::{csv_close, price_at, scrape_price};

/// goldapi.io spot price in USD per troy ounce.
pub async fn goldapi(http: &HttpClient, base: &str, key: &str, symbol: &str) -> Result<f64> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-access-token",
        HeaderValue::from_str(key)
            .map_err(|_| Error::ConfigError("goldapi_key is not a valid header".into()))?,
    );
    let url = format!("{}/api/{}/USD", base.trim_end_matches('/'), symbol);
    let body = http.get_json(&url, headers).await?;
    price_at(&body, "/price", "goldapi")
}

/// Yahoo Finance chart endpoint, e.g. `GC=F` for COMEX gold futures.
pub async fn yahoo(http: &HttpClient, base: &str, symbol: &str) -> Result<f64> {
    let url = format!(
        "{}/v8/finance/chart/{}?interval=1d&range=1d",
        base.trim_end_matches('/'),
        symbol
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    price_at(&body, "/chart/result/0/meta/regularMarketPrice", "yahoo")
}

/// Stooq quote CSV.
pub async fn stooq(http: &HttpClient, base: &str, symbol: &str) -> Result<f64> {
    let url = format!(
        "{}/q/l/?s={}&f=sd2t2ohlcv&h&e=csv",
        base.trim_end_matches('/'),
        symbol.to_ascii_lowercase()
    );
    let body = http.get_text(&url, HeaderMap::new()).await?;
    csv_close(&body, &url)
}

/// Splits a scrape target into its URL and optional label.
///
/// Everything after the last `#` is the label, so a target cannot carry a real
/// URL fragment. A trailing bare `#` means no label.
pub fn scrape_target(target: &str) -> (&str, Option<&str>) {
    match target.rsplit_once('#') {
        Some((url, label)) if !label.trim().is_empty() => (url, Some(label.trim())),
        Some((url, _)) => (url, None),
        None => (target, None),
    }
}

/// Generic page scrape. The target is `url` or `url#label`, see [`scrape_target`].
pub async fn scrape(http: &HttpClient, target: &str) -> Result<f64> {
    let (url, label) = scrape_target(target);
    let markup = http.get_text(url, HeaderMap::new()).await?;
    scrape_price(&markup, label, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_target_label_is_after_last_hash() {
        assert_eq!(
            scrape_target("https://www.kitco.com/charts/silver#Bid"),
            ("https://www.kitco.com/charts/silver", Some("Bid"))
        );
        assert_eq!(scrape_target("https://quotes.test/p"), ("https://quotes.test/p", None));
        assert_eq!(scrape_target("https://quotes.test/p# "), ("https://quotes.test/p", None));
        assert_eq!(
            scrape_target("https://quotes.test/p#top#Offer"),
            ("https://quotes.test/p#top", Some("Offer"))
        );
    }
}
