use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Fetch metrics
    pub static ref FETCH_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("source_fetch_attempts_total", "Adapter invocations by provider"),
        &["provider"]
    ).unwrap();

    pub static ref FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("source_fetch_failures_total", "Discarded adapter failures by provider and kind"),
        &["provider", "kind"]
    ).unwrap();

    // Cache metrics
    pub static ref PRICES_STORED: IntCounterVec = IntCounterVec::new(
        Opts::new("prices_stored_total", "Prices accepted into the cache by group"),
        &["group"]
    ).unwrap();

    pub static ref PRICES_REJECTED: IntCounter = IntCounter::new(
        "prices_rejected_total",
        "Guarded writes refused because the price was not positive and finite"
    ).unwrap();

    pub static ref CACHE_PERSIST_FAILURES: IntCounter = IntCounter::new(
        "cache_persist_failures_total",
        "Cache snapshot writes that failed"
    ).unwrap();

    // Cycle metrics
    pub static ref CYCLES_SKIPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("refresh_cycles_skipped_total", "Refresh cycles that did no work, by reason"),
        &["group", "reason"]
    ).unwrap();

    // Streaming metrics
    pub static ref STREAM_RECONNECTS: IntCounter = IntCounter::new(
        "stream_reconnects_total",
        "Streaming feed reconnect attempts"
    ).unwrap();

    pub static ref STREAM_MESSAGES: IntCounter = IntCounter::new(
        "stream_messages_total",
        "Trades applied to the streaming price table"
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(FETCH_ATTEMPTS.clone()))?;
    REGISTRY.register(Box::new(FETCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(PRICES_STORED.clone()))?;
    REGISTRY.register(Box::new(PRICES_REJECTED.clone()))?;
    REGISTRY.register(Box::new(CACHE_PERSIST_FAILURES.clone()))?;
    REGISTRY.register(Box::new(CYCLES_SKIPPED.clone()))?;
    REGISTRY.register(Box::new(STREAM_RECONNECTS.clone()))?;
    REGISTRY.register(Box::new(STREAM_MESSAGES.clone()))?;
    Ok(())
}

/// Prometheus text exposition of everything in `REGISTRY`.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
