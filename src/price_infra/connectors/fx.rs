//! Rate providers for a single base/quote pair.

use reqwest::header::HeaderMap;

use crate::error::Result;
use crate::price_infra::connectors::http::HttpClient;
use crate::price_infra::connectors::parse::price_at;

pub async fn frankfurter(http: &HttpClient, base_url: &str, base: &str, quote: &str) -> Result<f64> {
    let url = format!(
        "{}/latest?from={}&to={}",
        base_url.trim_end_matches('/'),
        base,
        quote
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    price_at(&body, &format!("/rates/{quote}"), "frankfurter")
}

pub async fn erapi(http: &HttpClient, base_url: &str, base: &str, quote: &str) -> Result<f64> {
    let url = format!("{}/v6/latest/{}", base_url.trim_end_matches('/'), base);
    let body = http.get_json(&url, HeaderMap::new()).await?;
    price_at(&body, &format!("/rates/{quote}"), "erapi")
}

pub async fn exchangerate_host(
    http: &HttpClient,
    base_url: &str,
    key: &str,
    base: &str,
    quote: &str,
) -> Result<f64> {
    let url = format!(
        "{}/live?access_key={}&source={}&currencies={}",
        base_url.trim_end_matches('/'),
        key,
        base,
        quote
    );
    let body = http.get_json(&url, HeaderMap::new()).await?;
    price_at(&body, &format!("/quotes/{base}{quote}"), "exchangeratehost")
}
