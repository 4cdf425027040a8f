use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Oz,
    Usd,
    Rate,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Oz => "oz",
            Unit::Usd => "usd",
            Unit::Rate => "rate",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known good value for one symbol.
///
/// Records are never mutated in place; the cache replaces the whole record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub symbol: String,
    pub price: f64,
    pub unit: Unit,
    pub source: String,
    pub captured_at: DateTime<Utc>,
}

/// Accepts only values a cache may ever hold.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Interprets a loosely typed JSON value (number or numeric string) as a price.
pub fn price_from_json(value: &serde_json::Value) -> Option<f64> {
    let price = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    is_valid_price(price).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert!(is_valid_price(0.0001));
        assert!(!is_valid_price(0.0));
        assert!(!is_valid_price(-3.0));
        assert!(!is_valid_price(f64::NAN));
        assert!(!is_valid_price(f64::INFINITY));
    }

    #[test]
    fn reads_numbers_and_numeric_strings() {
        assert_eq!(price_from_json(&json!(2000)), Some(2000.0));
        assert_eq!(price_from_json(&json!("1,950.25")), Some(1950.25));
        assert_eq!(price_from_json(&json!("abc")), None);
        assert_eq!(price_from_json(&json!(0)), None);
        assert_eq!(price_from_json(&json!(null)), None);
    }

    #[test]
    fn record_uses_camel_case_keys() {
        let record = PriceRecord {
            symbol: "GOLD".into(),
            price: 1950.25,
            unit: Unit::Oz,
            source: "yahoo".into(),
            captured_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["unit"], "oz");
        assert!(value.get("capturedAt").is_some());
    }
}
