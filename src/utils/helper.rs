use chrono::{DateTime, Datelike, Utc, Weekday};

/// Saturday or Sunday in UTC. Spot metal markets are closed.
pub fn is_weekend(at: DateTime<Utc>) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Split a `A,B , C` query value into trimmed, uppercased, non-empty symbols.
pub fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}
