use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

use price_relay::api::{ApiState, create_router};
use price_relay::cache::GuardedCache;
use price_relay::config::{FallbackConfig, SourceRegistry};
use price_relay::error::Result;
use price_relay::price_infra::SourceDescriptor;
use price_relay::price_infra::connectors::PriceFetcher;
use price_relay::price_infra::connectors::binance::StreamTable;
use price_relay::price_infra::orchestrator::Orchestrator;
use price_relay::types::Unit;

const TOKEN: &str = "s3cret";

/// Every source answers with the same price.
struct FixedFetcher(f64);

#[async_trait]
impl PriceFetcher for FixedFetcher {
    async fn fetch_price(&self, _source: &SourceDescriptor) -> Result<f64> {
        Ok(self.0)
    }

    async fn fetch_basket(&self, source: &SourceDescriptor) -> Result<Vec<(String, f64)>> {
        Ok(source.basket_symbols().into_iter().map(|s| (s, self.0)).collect())
    }
}

struct TestApp {
    router: Router,
    cache: Arc<GuardedCache>,
    _dir: TempDir,
}

fn app(admin_token: Option<&str>) -> TestApp {
    let dir = tempdir().unwrap();
    let cache = Arc::new(GuardedCache::open(dir.path().join("cache.json")).unwrap());
    let orchestrator = Orchestrator::new(
        cache.clone(),
        Arc::new(SourceRegistry::with_defaults().unwrap()),
        Arc::new(FixedFetcher(0.92)),
        StreamTable::new(),
        &FallbackConfig::default(),
    )
    .unwrap();
    let router = create_router(Arc::new(ApiState {
        orchestrator: Arc::new(orchestrator),
        admin_token: admin_token.map(str::to_string),
    }));
    TestApp { router, cache, _dir: dir }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let app = app(None);
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!((status, body), (StatusCode::OK, Value::String("OK".into())));

    let (status, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let app = app(Some(TOKEN));
    let (status, body) = send(&app.router, get("/api/price/GOLD")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn manual_override_is_served_with_manual_source() {
    let app = app(Some(TOKEN));
    let (status, _) = send(
        &app.router,
        post("/api/admin/price", Some(TOKEN), json!({"symbol": "gold", "price": 2000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, get("/api/price/GOLD")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 2000.0);
    assert_eq!(body["src"], "manual");
    assert_eq!(body["unit"], "oz");
    assert!(body["capturedAt"].is_string());
}

#[tokio::test]
async fn bad_manual_price_leaves_record_untouched() {
    let app = app(Some(TOKEN));
    app.cache.put("GOLD", 1950.25, Unit::Oz, "yahoo").unwrap();
    let before = app.cache.get("GOLD").unwrap();

    for price in [json!("abc"), json!(0), json!(-3.5), Value::Null] {
        let (status, _) = send(
            &app.router,
            post("/api/admin/price", Some(TOKEN), json!({"symbol": "GOLD", "price": price})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, _) = send(&app.router, post("/api/admin/price", Some(TOKEN), json!({"symbol": "GOLD"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.cache.get("GOLD").unwrap(), before);
}

#[tokio::test]
async fn numeric_string_price_is_accepted() {
    let app = app(Some(TOKEN));
    let (status, body) = send(
        &app.router,
        post("/api/admin/price", Some(TOKEN), json!({"symbol": "FX_USD_EUR", "price": "0.9312"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["unit"], "rate");
}

#[tokio::test]
async fn admin_requires_matching_token() {
    let app = app(Some(TOKEN));
    let (status, _) = send(&app.router, post("/api/admin/clear", Some("wrong"), json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app.router, post("/api/admin/clear", None, json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, post(&format!("/api/admin/clear?token={TOKEN}"), None, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, post("/api/admin/clear", None, json!({"token": TOKEN}))).await;
    assert_eq!(status, StatusCode::OK);

    let bearer = Request::builder()
        .method("POST")
        .uri("/api/admin/clear")
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, bearer).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_disabled_without_configured_token() {
    let app = app(None);
    let (status, _) = send(
        &app.router,
        post("/api/admin/price", Some(TOKEN), json!({"symbol": "GOLD", "price": 2000})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.cache.get("GOLD").is_none());
}

#[tokio::test]
async fn clear_empties_prices_but_keeps_rotation() {
    let app = app(Some(TOKEN));
    app.cache.put("BTC", 64000.0, Unit::Usd, "coingecko").unwrap();
    app.cache.advance_cursor(price_relay::types::Group::Crypto, 4).unwrap();

    let (status, body) = send(&app.router, post("/api/admin/clear", Some(TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);
    assert!(app.cache.get("BTC").is_none());
    assert_eq!(app.cache.cursor(price_relay::types::Group::Crypto), 1);
}

#[tokio::test]
async fn refresh_reports_groups_only() {
    let app = app(Some(TOKEN));
    let (status, body) = send(&app.router, post("/api/admin/refresh", Some(TOKEN), json!({"group": "fx"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "groups": ["fx"]}));

    let (status, body) = send(&app.router, get("/api/price/FX_USD_EUR")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 0.92);

    let (status, _) = send(&app.router, post("/api/admin/refresh", Some(TOKEN), json!({"group": "bonds"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_listing_maps_each_symbol() {
    let app = app(Some(TOKEN));
    app.cache.put("GOLD", 2301.5, Unit::Oz, "stooq").unwrap();

    let (status, body) = send(&app.router, get("/api/groups/spot")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["GOLD"]["price"], 2301.5);
    assert_eq!(body["SILVER"], json!({"error": "not found"}));

    let (_, body) = send(&app.router, get("/api/groups/crypto?symbols=btc,%20eth")).await;
    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["BTC", "ETH"]);

    let (status, _) = send(&app.router, get("/api/groups/bonds")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
