use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::{Error, Result};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Token presented by an admin caller: `x-admin-token` header, then
/// `Authorization: Bearer`, then `?token=`, then the body's `token` field.
pub fn presented_token<'a>(
    headers: &'a HeaderMap,
    query_token: Option<&'a str>,
    body_token: Option<&'a str>,
) -> Option<&'a str> {
    let header = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    [header, bearer, query_token, body_token]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
}

/// Admin access requires a configured secret and a matching presented token.
pub fn authorize(expected: Option<&str>, presented: Option<&str>) -> Result<()> {
    let expected = expected.map(str::trim).filter(|t| !t.is_empty());
    match (expected, presented) {
        (Some(expected), Some(presented)) if constant_time_eq(expected, presented) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
