use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::price::is_valid_price;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"(?s)<script.*?</script>|<style.*?</style>|<[^>]*>").unwrap();
    // leading sign kept; the price guard rejects negatives
    static ref NUMBER: Regex = Regex::new(
        r"[-\x{2212}]?(?:[0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?)"
    )
    .unwrap();
    static ref LABELED: DashMap<String, Regex> = DashMap::new();
}

/// Read the number at `pointer` (RFC 6901). Numeric strings are accepted.
pub fn price_at(value: &Value, pointer: &str, provider: &'static str) -> Result<f64> {
    let field = value.pointer(pointer).ok_or_else(|| Error::MissingField {
        provider,
        field: pointer.to_string(),
    })?;
    let price = number(field)?;
    if !is_valid_price(price) {
        return Err(Error::InvalidPrice(price));
    }
    Ok(price)
}

fn number(field: &Value) -> Result<f64> {
    match field {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::InvalidNumber(n.to_string())),
        Value::String(s) => parse_number(s),
        other => Err(Error::InvalidNumber(other.to_string())),
    }
}

pub fn parse_number(raw: &str) -> Result<f64> {
    raw.trim()
        .replace(',', "")
        .replace('\u{2212}', "-")
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber(raw.to_string()))
}

/// Markup reduced to visible text.
pub fn visible_text(markup: &str) -> String {
    TAG.replace_all(markup, " ")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
}

/// Pattern for `label` followed by a number, compiled on first use.
fn label_pattern(label: &str) -> Option<Regex> {
    if let Some(re) = LABELED.get(label) {
        return Some(re.clone());
    }
    let pattern = format!(
        r"(?i){}[^0-9]{{0,40}}?({})",
        regex::escape(label),
        NUMBER.as_str()
    );
    let re = Regex::new(&pattern).ok()?;
    LABELED.insert(label.to_string(), re.clone());
    Some(re)
}

/// First number following `label` (case-insensitive) within a short window.
pub fn labeled_value(text: &str, label: &str) -> Option<f64> {
    label_pattern(label)?
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_number(m.as_str()).ok())
        .find(|p| is_valid_price(*p))
}

/// First decimal number in the text that is a usable price. Bare integers are
/// skipped since pages are full of years, counts and ids.
pub fn first_plausible_number(text: &str) -> Option<f64> {
    NUMBER
        .find_iter(text)
        .filter(|m| m.as_str().contains('.'))
        .filter_map(|m| parse_number(m.as_str()).ok())
        .find(|p| is_valid_price(*p))
}

/// Scrape a page for `label`'s value, or the first plausible number when no label is given.
pub fn scrape_price(markup: &str, label: Option<&str>, origin: &str) -> Result<f64> {
    let text = visible_text(markup);
    let found = match label {
        Some(label) => labeled_value(&text, label),
        None => first_plausible_number(&text),
    };
    found.ok_or_else(|| Error::PatternNotFound(origin.to_string()))
}

/// `Close` column of a one-row quote CSV with a header line.
pub fn csv_close(body: &str, origin: &str) -> Result<f64> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next().ok_or_else(|| Error::PatternNotFound(origin.to_string()))?;
    let row = lines.next().ok_or_else(|| Error::PatternNotFound(origin.to_string()))?;

    let column = header
        .split(',')
        .position(|h| h.trim().eq_ignore_ascii_case("close"))
        .ok_or_else(|| Error::MissingField {
            provider: "stooq",
            field: "Close".to_string(),
        })?;
    let cell = row.split(',').nth(column).ok_or_else(|| Error::MissingField {
        provider: "stooq",
        field: "Close".to_string(),
    })?;

    let price = parse_number(cell)?;
    if !is_valid_price(price) {
        return Err(Error::InvalidPrice(price));
    }
    Ok(price)
}
