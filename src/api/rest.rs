use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::api::{ApiError, ApiState};
use crate::error::Error;
use crate::observability::metrics;
use crate::types::{Group, PriceRecord, Unit};
use crate::utils::helper::split_symbols;

/// Wire shape of a cached price.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceView {
    pub price: f64,
    pub unit: Unit,
    pub src: String,
    pub captured_at: DateTime<Utc>,
}

impl From<PriceRecord> for PriceView {
    fn from(record: PriceRecord) -> Self {
        PriceView {
            price: record.price,
            unit: record.unit,
            src: record.source,
            captured_at: record.captured_at,
        }
    }
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/api/price/:symbol", get(get_price))
        .route("/api/groups/:group", get(get_group))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_text() -> String {
    metrics::render()
}

fn not_found() -> Value {
    json!({ "error": "not found" })
}

async fn get_price(State(state): State<Arc<ApiState>>, Path(symbol): Path<String>) -> Response {
    match state.cache().get(&symbol.trim().to_ascii_uppercase()) {
        Some(record) => Json(PriceView::from(record)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(not_found())).into_response(),
    }
}

#[derive(Deserialize)]
struct GroupQuery {
    symbols: Option<String>,
}

/// Groups as the read API names them; `spot` covers gold and silver.
fn groups_for(name: &str) -> Result<Vec<Group>, Error> {
    if name.eq_ignore_ascii_case("spot") {
        return Ok(vec![Group::Gold, Group::Silver]);
    }
    Group::from_str(name).map(|g| vec![g])
}

async fn get_group(
    State(state): State<Arc<ApiState>>,
    Path(group): Path<String>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    let groups = groups_for(&group)?;
    let symbols = match query.symbols.as_deref().map(split_symbols) {
        Some(symbols) if !symbols.is_empty() => symbols,
        _ => groups
            .iter()
            .flat_map(|g| state.registry().default_symbols(*g))
            .collect(),
    };

    let prices = symbols
        .into_iter()
        .map(|symbol| {
            let entry = match state.cache().get(&symbol) {
                Some(record) => json!(PriceView::from(record)),
                None => not_found(),
            };
            (symbol, entry)
        })
        .collect();
    Ok(Json(prices))
}
