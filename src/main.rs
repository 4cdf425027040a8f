use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use price_relay::api::{ApiState, create_router};
use price_relay::cache::GuardedCache;
use price_relay::config::{AppConfig, SourceRegistry};
use price_relay::observability::metrics::register_metrics;
use price_relay::observability::tracing::init_tracing;
use price_relay::price_infra::connectors::SourceAdapters;
use price_relay::price_infra::connectors::binance::{StreamTable, StreamingFeed};
use price_relay::price_infra::orchestrator::Orchestrator;
use price_relay::scheduler::Scheduler;
use price_relay::utils::task_supervisor::TaskSupervisor;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;
    init_tracing(&config.logging);
    register_metrics().context("registering metrics")?;

    let cache = Arc::new(GuardedCache::open(&config.cache.path)?);
    let registry = Arc::new(
        SourceRegistry::load(config.sources.override_path.as_deref())
            .context("loading source lists")?,
    );
    let adapters = SourceAdapters::new(
        &config.fetch,
        config.endpoints.clone(),
        config.credentials.clone(),
    )?;
    let table = StreamTable::new();
    let orchestrator = Arc::new(Orchestrator::new(
        cache.clone(),
        registry,
        Arc::new(adapters),
        table.clone(),
        &config.fallback,
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut supervisor = TaskSupervisor::new();

    if config.streaming.enabled {
        let feed = StreamingFeed::binance(&config.streaming, &config.endpoints.binance_ws, table);
        supervisor.spawn("streaming_feed", feed.run(shutdown_rx.clone()));
    }
    Scheduler::new(orchestrator.clone(), config.schedule.clone())
        .spawn(&mut supervisor, shutdown_rx.clone());

    if config.server.admin_token.is_none() {
        tracing::warn!("No admin token configured, admin endpoints are disabled");
    }
    let app = create_router(Arc::new(ApiState {
        orchestrator,
        admin_token: config.server.admin_token.clone(),
    }));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    tracing::info!("Price relay listening on {}", config.server.bind_addr);

    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Signal handler failed");
                }
                break;
            }
            _ = health.tick() => {
                if let Err(e) = supervisor.check_health() {
                    tracing::error!(error = %e, "Background task health check failed");
                }
            }
        }
    }

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    server.await??;

    if tokio::time::timeout(SHUTDOWN_GRACE, supervisor.join_all()).await.is_err() {
        supervisor.shutdown_all();
    }
    cache.save().context("final cache save")?;
    Ok(())
}
