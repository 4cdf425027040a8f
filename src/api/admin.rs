use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::post,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;

use crate::api::auth::{authorize, presented_token};
use crate::api::rest::PriceView;
use crate::api::{ApiError, ApiState};
use crate::cache::PutOutcome;
use crate::config::SourceRegistry;
use crate::error::Error;
use crate::price_infra::orchestrator::CycleReport;
use crate::types::price::price_from_json;
use crate::types::{Group, Unit};

pub const MANUAL_SOURCE: &str = "manual";

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/admin/price", post(set_price))
        .route("/api/admin/refresh", post(refresh))
        .route("/api/admin/clear", post(clear))
}

#[derive(Deserialize, Default)]
pub struct TokenQuery {
    token: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct PriceBody {
    symbol: Option<String>,
    price: Option<Value>,
    unit: Option<Unit>,
    token: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct RefreshBody {
    group: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ClearBody {
    token: Option<String>,
}

fn check(
    state: &ApiState,
    headers: &HeaderMap,
    query: &TokenQuery,
    body_token: Option<&str>,
) -> Result<(), ApiError> {
    let presented = presented_token(headers, query.token.as_deref(), body_token);
    authorize(state.admin_token.as_deref(), presented).inspect_err(|_| {
        tracing::warn!("Rejected admin request");
    })?;
    Ok(())
}

/// Unit for a manual price when the caller does not name one.
fn unit_guess(registry: &SourceRegistry, symbol: &str) -> Unit {
    if symbol.starts_with("FX_") {
        return Unit::Rate;
    }
    if matches!(symbol, "GOLD" | "SILVER") {
        return Unit::Oz;
    }
    if registry
        .sub_symbols(Group::Metals)
        .iter()
        .any(|s| s.symbol == symbol)
    {
        return Group::Metals.unit_for(symbol);
    }
    Unit::Usd
}

async fn set_price(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    body: Option<Json<PriceBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    check(&state, &headers, &query, body.token.as_deref())?;

    let symbol = body
        .symbol
        .as_deref()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::BadRequest("symbol required".to_string()))?;
    let price = body
        .price
        .as_ref()
        .and_then(price_from_json)
        .ok_or_else(|| Error::BadRequest("price must be numeric".to_string()))?;
    let unit = body
        .unit
        .unwrap_or_else(|| unit_guess(state.registry(), &symbol));

    match state.cache().put(&symbol, price, unit, MANUAL_SOURCE)? {
        PutOutcome::Stored => {
            tracing::info!(symbol = %symbol, price, "Manual price override");
            let record = state.cache().get(&symbol).map(PriceView::from);
            Ok(Json(json!({ "ok": true, "symbol": symbol, "record": record })))
        }
        PutOutcome::Rejected => Err(Error::BadRequest("price must be positive".to_string()).into()),
    }
}

/// Requested groups; `all` or no group means every group, `spot` means gold and silver.
fn refresh_targets(group: Option<&str>) -> Result<Vec<Group>, Error> {
    match group.map(str::trim) {
        None | Some("") => Ok(Group::ALL.to_vec()),
        Some(g) if g.eq_ignore_ascii_case("all") => Ok(Group::ALL.to_vec()),
        Some(g) if g.eq_ignore_ascii_case("spot") => Ok(vec![Group::Gold, Group::Silver]),
        Some(g) => Group::from_str(g).map(|g| vec![g]),
    }
}

async fn refresh(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    body: Option<Json<RefreshBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    check(&state, &headers, &query, body.token.as_deref())?;

    let groups = refresh_targets(body.group.as_deref())?;
    let reports: Vec<CycleReport> = futures_util::future::join_all(
        groups.iter().map(|g| state.orchestrator.refresh(*g)),
    )
    .await;

    let failures: usize = reports.iter().map(|r| r.failures.len()).sum();
    tracing::info!(groups = ?groups, failures, "Admin refresh complete");

    let names: Vec<&str> = groups.iter().map(Group::as_str).collect();
    Ok(Json(json!({ "ok": true, "groups": names })))
}

async fn clear(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    body: Option<Json<ClearBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    check(&state, &headers, &query, body.token.as_deref())?;

    let cleared = state.cache().clear()?;
    Ok(Json(json!({ "ok": true, "cleared": cleared })))
}
