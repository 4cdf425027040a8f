use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Instrument;

use crate::cache::{GuardedCache, PutOutcome};
use crate::config::sources::SubSymbolSources;
use crate::config::{FallbackConfig, SourceRegistry};
use crate::error::{Error, FailureKind, Result};
use crate::observability::metrics::{CYCLES_SKIPPED, FETCH_ATTEMPTS, FETCH_FAILURES, PRICES_STORED};
use crate::observability::tracing::trace_refresh_cycle;
use crate::price_infra::connectors::PriceFetcher;
use crate::price_infra::connectors::binance::StreamTable;
use crate::price_infra::rotation::RotationScheduler;
use crate::price_infra::{Identifier, Provider, SourceDescriptor, fx_symbol};
use crate::types::Group;
use crate::utils::helper::is_weekend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleStatus {
    Completed,
    /// Spot metals on a UTC weekend.
    Idle,
    /// Another cycle for the same group was still running.
    Skipped,
    NoSources,
}

/// A source attempt that was abandoned during a cycle.
#[derive(Clone, Debug)]
pub struct SourceFailure {
    pub source: String,
    pub symbol: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct CycleReport {
    pub group: Group,
    pub status: CycleStatus,
    pub written: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

impl CycleReport {
    fn empty(group: Group, status: CycleStatus) -> Self {
        CycleReport {
            group,
            status,
            written: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Writes and failures collected while a cycle runs.
#[derive(Default)]
struct Tally {
    written: Vec<String>,
    failures: Vec<SourceFailure>,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, group: Group, source: &SourceDescriptor, symbol: Option<&str>, error: Error) {
        let kind = error.kind();
        FETCH_FAILURES
            .with_label_values(&[source.label(), kind.as_str()])
            .inc();
        tracing::warn!(
            group = %group,
            source = %source,
            symbol = symbol.unwrap_or("-"),
            kind = kind.as_str(),
            error = %error,
            "Source attempt abandoned"
        );
        self.failures.push(SourceFailure {
            source: source.to_string(),
            symbol: symbol.map(str::to_string),
            kind,
            message: error.to_string(),
        });
    }
}

/// Releases the group's in-flight flag when the cycle ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs refresh cycles: rotation, adapter calls, fallbacks and guarded writes.
pub struct Orchestrator {
    cache: Arc<GuardedCache>,
    registry: Arc<SourceRegistry>,
    rotation: RotationScheduler,
    fetcher: Arc<dyn PriceFetcher>,
    stream: StreamTable,
    silver_fallback: Option<SourceDescriptor>,
    metals_template: String,
    in_flight: HashMap<Group, AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<GuardedCache>,
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn PriceFetcher>,
        stream: StreamTable,
        fallback: &FallbackConfig,
    ) -> Result<Self> {
        let silver_fallback = match fallback.silver.trim() {
            "" => None,
            raw => Some(SourceDescriptor::parse(raw)?),
        };

        Ok(Orchestrator {
            rotation: RotationScheduler::new(registry.clone(), cache.clone()),
            cache,
            registry,
            fetcher,
            stream,
            silver_fallback,
            metals_template: fallback.metals_template.trim().to_string(),
            in_flight: Group::ALL.into_iter().map(|g| (g, AtomicBool::new(false))).collect(),
        })
    }

    pub fn cache(&self) -> &Arc<GuardedCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub async fn refresh(&self, group: Group) -> CycleReport {
        self.refresh_at(group, Utc::now()).await
    }

    /// Refresh every group concurrently and wait for all of them.
    pub async fn refresh_all(&self) -> Vec<CycleReport> {
        join_all(Group::ALL.into_iter().map(|g| self.refresh(g))).await
    }

    /// One cycle for `group` as if the wall clock read `now`.
    pub async fn refresh_at(&self, group: Group, now: DateTime<Utc>) -> CycleReport {
        let Some(_guard) = self.try_enter(group) else {
            CYCLES_SKIPPED.with_label_values(&[group.as_str(), "in_flight"]).inc();
            tracing::info!(group = %group, "Refresh already running, skipping");
            return CycleReport::empty(group, CycleStatus::Skipped);
        };

        if !group.trades_on_weekends() && is_weekend(now) {
            CYCLES_SKIPPED.with_label_values(&[group.as_str(), "weekend"]).inc();
            tracing::debug!(group = %group, "Market closed for the weekend");
            return CycleReport::empty(group, CycleStatus::Idle);
        }

        let span = trace_refresh_cycle(group);
        async {
            let mut tally = Tally::default();
            let status = match group {
                Group::Gold | Group::Silver => self.refresh_spot(group, &mut tally).await,
                Group::Crypto => self.refresh_crypto(&mut tally).await,
                Group::Fx => self.refresh_fx(&mut tally).await,
                Group::Metals | Group::Energy => self.refresh_nested(group, &mut tally).await,
            };

            if status == CycleStatus::NoSources {
                CYCLES_SKIPPED.with_label_values(&[group.as_str(), "no_sources"]).inc();
                tracing::warn!(group = %group, "No sources configured");
            }

            if !tally.written.is_empty() {
                if let Err(e) = self.cache.touch(group) {
                    tracing::warn!(group = %group, error = %e, "Last update not persisted");
                }
            }

            tracing::info!(
                written = tally.written.len(),
                failures = tally.failures.len(),
                "Refresh cycle finished"
            );
            CycleReport {
                group,
                status,
                written: tally.written,
                failures: tally.failures,
            }
        }
        .instrument(span)
        .await
    }

    fn try_enter(&self, group: Group) -> Option<InFlightGuard<'_>> {
        let flag = self.in_flight.get(&group)?;
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag })
    }

    async fn refresh_spot(&self, group: Group, tally: &mut Tally) -> CycleStatus {
        let symbol = match group {
            Group::Silver => "SILVER",
            _ => "GOLD",
        };
        let Some(source) = self.rotation.pick_next(group) else {
            return CycleStatus::NoSources;
        };

        let mut stored = self.attempt(group, symbol, &source, tally).await;

        if group == Group::Silver && !stored {
            if let Some(fallback) = &self.silver_fallback {
                tracing::debug!(source = %fallback, "Trying silver fallback");
                stored = self.attempt(group, symbol, fallback, tally).await;
            }
        }
        if !stored {
            tracing::debug!(group = %group, "Keeping last known price");
        }
        CycleStatus::Completed
    }

    async fn refresh_crypto(&self, tally: &mut Tally) -> CycleStatus {
        let group = Group::Crypto;
        let Some(source) = self.rotation.pick_next(group) else {
            return CycleStatus::NoSources;
        };
        FETCH_ATTEMPTS.with_label_values(&[source.label()]).inc();

        match (&source.provider, &source.identifier) {
            (Provider::Stream, Identifier::Basket(entries)) => {
                for entry in entries {
                    match self.stream.latest(&entry.provider_id) {
                        Some(price) => {
                            self.store(group, &entry.symbol, price, &source, tally);
                        }
                        None => tally.fail(
                            group,
                            &source,
                            Some(&entry.symbol),
                            Error::StreamUnavailable(entry.provider_id.clone()),
                        ),
                    }
                }
            }
            _ => match self.fetcher.fetch_basket(&source).await {
                Ok(prices) => {
                    for (symbol, price) in prices {
                        self.store(group, &symbol, price, &source, tally);
                    }
                }
                Err(e) => tally.fail(group, &source, None, e),
            },
        }
        CycleStatus::Completed
    }

    async fn refresh_fx(&self, tally: &mut Tally) -> CycleStatus {
        let group = Group::Fx;
        let Some(source) = self.rotation.pick_next(group) else {
            return CycleStatus::NoSources;
        };

        match &source.identifier {
            Identifier::Pair { base, quote } => {
                let symbol = fx_symbol(base, quote);
                self.attempt(group, &symbol, &source, tally).await;
            }
            Identifier::Symbol(_) | Identifier::Basket(_) => tally.fail(
                group,
                &source,
                None,
                Error::UnsupportedIdentifier {
                    provider: source.label(),
                    requested: "an FX pair",
                },
            ),
        }
        CycleStatus::Completed
    }

    async fn refresh_nested(&self, group: Group, tally: &mut Tally) -> CycleStatus {
        let subs = self.registry.sub_symbols(group);
        if subs.is_empty() {
            return CycleStatus::NoSources;
        }

        let outcomes = join_all(subs.iter().map(|sub| self.walk_sub_symbol(group, sub))).await;
        for outcome in outcomes {
            tally.merge(outcome);
        }
        CycleStatus::Completed
    }

    /// First source in the sub-symbol's list that yields a price wins.
    async fn walk_sub_symbol(&self, group: Group, sub: &SubSymbolSources) -> Tally {
        let mut tally = Tally::default();
        for source in &sub.sources {
            if self.attempt(group, &sub.symbol, source, &mut tally).await {
                return tally;
            }
        }

        if group == Group::Metals && !self.metals_template.is_empty() {
            let raw = self
                .metals_template
                .replace("{name}", &sub.symbol.to_ascii_lowercase());
            match SourceDescriptor::parse(&raw) {
                Ok(last_resort) => {
                    self.attempt(group, &sub.symbol, &last_resort, &mut tally).await;
                }
                Err(e) => tracing::warn!(error = %e, "Metals last-resort template unusable"),
            }
        }
        tally
    }

    /// Fetch one price from `source` and store it under `symbol`. True when stored.
    async fn attempt(
        &self,
        group: Group,
        symbol: &str,
        source: &SourceDescriptor,
        tally: &mut Tally,
    ) -> bool {
        FETCH_ATTEMPTS.with_label_values(&[source.label()]).inc();
        match self.fetcher.fetch_price(source).await {
            Ok(price) => self.store(group, symbol, price, source, tally),
            Err(e) => {
                tally.fail(group, source, Some(symbol), e);
                false
            }
        }
    }

    fn store(
        &self,
        group: Group,
        symbol: &str,
        price: f64,
        source: &SourceDescriptor,
        tally: &mut Tally,
    ) -> bool {
        let unit = group.unit_for(symbol);
        match self.cache.put(symbol, price, unit, source.label()) {
            Ok(PutOutcome::Stored) => {
                PRICES_STORED.with_label_values(&[group.as_str()]).inc();
                tracing::debug!(symbol, price, source = source.label(), "Stored price");
                tally.written.push(symbol.to_string());
                true
            }
            Ok(PutOutcome::Rejected) => {
                tally.fail(group, source, Some(symbol), Error::InvalidPrice(price));
                false
            }
            Err(e) => {
                // the in-memory record is already replaced; only the file lags
                tally.written.push(symbol.to_string());
                tally.fail(group, source, Some(symbol), e);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::connectors::MockPriceFetcher;
    use chrono::TimeZone;
    use tempfile::{TempDir, tempdir};

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    fn saturday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap()
    }

    fn descriptors(raw: &[&str]) -> Vec<SourceDescriptor> {
        raw.iter().map(|r| SourceDescriptor::parse(r).unwrap()).collect()
    }

    struct Harness {
        orchestrator: Orchestrator,
        cache: Arc<GuardedCache>,
        stream: StreamTable,
        _dir: TempDir,
    }

    fn harness(registry: SourceRegistry, fetcher: MockPriceFetcher, fallback: FallbackConfig) -> Harness {
        let dir = tempdir().unwrap();
        let cache = Arc::new(GuardedCache::open(dir.path().join("cache.json")).unwrap());
        let stream = StreamTable::new();
        let orchestrator = Orchestrator::new(
            cache.clone(),
            Arc::new(registry),
            Arc::new(fetcher),
            stream.clone(),
            &fallback,
        )
        .unwrap();
        Harness { orchestrator, cache, stream, _dir: dir }
    }

    #[tokio::test]
    async fn failed_source_keeps_record_and_rotation_moves_on() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Gold, descriptors(&["yahoo:GC=F", "stooq:xauusd"]));

        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Yahoo)
            .times(1)
            .returning(|_| Err(Error::HttpStatus { status: 503, url: "yahoo".into() }));
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Stooq)
            .times(1)
            .returning(|_| Ok(1950.25));

        let h = harness(registry, fetcher, FallbackConfig::default());

        let first = h.orchestrator.refresh_at(Group::Gold, wednesday()).await;
        assert_eq!(first.status, CycleStatus::Completed);
        assert!(first.written.is_empty());
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.failures[0].kind, FailureKind::Transient);
        assert!(h.cache.get("GOLD").is_none());
        assert!(h.cache.last_update(Group::Gold).is_none());

        let second = h.orchestrator.refresh_at(Group::Gold, wednesday()).await;
        assert_eq!(second.written, vec!["GOLD"]);
        let gold = h.cache.get("GOLD").unwrap();
        assert_eq!(gold.price, 1950.25);
        assert_eq!(gold.unit, crate::types::Unit::Oz);
        assert_eq!(gold.source, "stooq");
        assert!(h.cache.last_update(Group::Gold).is_some());
    }

    #[tokio::test]
    async fn weekend_spot_cycle_fetches_nothing() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Gold, descriptors(&["yahoo:GC=F"]));
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_fetch_price().times(0);

        let h = harness(registry, fetcher, FallbackConfig::default());
        let report = h.orchestrator.refresh_at(Group::Gold, saturday()).await;

        assert_eq!(report.status, CycleStatus::Idle);
        assert!(h.cache.last_update(Group::Gold).is_none());
        assert_eq!(h.cache.cursor(Group::Gold), 0);
    }

    #[tokio::test]
    async fn silver_falls_back_to_fixed_scrape() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Silver, descriptors(&["yahoo:SI=F"]));

        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Yahoo)
            .returning(|_| Err(Error::PatternNotFound("yahoo".into())));
        fetcher
            .expect_fetch_price()
            .withf(|s| {
                s.identifier == Identifier::Symbol("https://quotes.test/silver#Bid".into())
            })
            .times(1)
            .returning(|_| Ok(24.31));

        let fallback = FallbackConfig {
            silver: "scrape:https://quotes.test/silver#Bid".into(),
            ..FallbackConfig::default()
        };
        let h = harness(registry, fetcher, fallback);
        let report = h.orchestrator.refresh_at(Group::Silver, wednesday()).await;

        assert_eq!(report.written, vec!["SILVER"]);
        assert_eq!(report.failures.len(), 1);
        let silver = h.cache.get("SILVER").unwrap();
        assert_eq!((silver.price, silver.source.as_str()), (24.31, "scrape"));
    }

    #[tokio::test]
    async fn metals_walk_list_then_last_resort() {
        let mut registry = SourceRegistry::default();
        registry.set_sub_symbols(
            Group::Metals,
            vec![
                SubSymbolSources {
                    symbol: "PLATINUM".into(),
                    sources: descriptors(&["yahoo:PL=F", "stooq:xptusd"]),
                },
                SubSymbolSources {
                    symbol: "COPPER".into(),
                    sources: descriptors(&["yahoo:HG=F"]),
                },
            ],
        );

        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Yahoo)
            .returning(|s| match &s.identifier {
                Identifier::Symbol(sym) if sym == "HG=F" => Ok(4.12),
                _ => Err(Error::Transport("reset".into())),
            });
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Stooq)
            .returning(|_| Err(Error::InvalidNumber("N/D".into())));
        fetcher
            .expect_fetch_price()
            .withf(|s| s.identifier == Identifier::Symbol("https://quotes.test/platinum#platinum".into()))
            .times(1)
            .returning(|_| Ok(1012.5));

        let fallback = FallbackConfig {
            metals_template: "scrape:https://quotes.test/{name}#{name}".into(),
            ..FallbackConfig::default()
        };
        let h = harness(registry, fetcher, fallback);
        let report = h.orchestrator.refresh_at(Group::Metals, wednesday()).await;

        assert_eq!(report.failures.len(), 2);
        let platinum = h.cache.get("PLATINUM").unwrap();
        assert_eq!((platinum.price, platinum.source.as_str()), (1012.5, "scrape"));
        assert_eq!(platinum.unit, crate::types::Unit::Oz);
        let copper = h.cache.get("COPPER").unwrap();
        assert_eq!((copper.price, copper.unit), (4.12, crate::types::Unit::Usd));
    }

    #[tokio::test]
    async fn metals_walk_stops_at_first_success() {
        let mut registry = SourceRegistry::default();
        registry.set_sub_symbols(
            Group::Metals,
            vec![SubSymbolSources {
                symbol: "PLATINUM".into(),
                sources: descriptors(&["yahoo:PL=F", "stooq:xptusd"]),
            }],
        );

        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Yahoo)
            .times(1)
            .returning(|_| Ok(1008.75));
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Stooq)
            .times(0);
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Scrape)
            .times(0);

        let fallback = FallbackConfig {
            metals_template: "scrape:https://quotes.test/{name}#{name}".into(),
            ..FallbackConfig::default()
        };
        let h = harness(registry, fetcher, fallback);
        let report = h.orchestrator.refresh_at(Group::Metals, wednesday()).await;

        assert!(report.failures.is_empty());
        let platinum = h.cache.get("PLATINUM").unwrap();
        assert_eq!((platinum.price, platinum.source.as_str()), (1008.75, "yahoo"));
    }

    #[tokio::test]
    async fn silver_fallback_unused_when_rotated_source_succeeds() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Silver, descriptors(&["yahoo:SI=F"]));

        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Yahoo)
            .times(1)
            .returning(|_| Ok(24.05));
        fetcher
            .expect_fetch_price()
            .withf(|s| s.provider == Provider::Scrape)
            .times(0);

        let fallback = FallbackConfig {
            silver: "scrape:https://quotes.test/silver#Bid".into(),
            ..FallbackConfig::default()
        };
        let h = harness(registry, fetcher, fallback);
        let report = h.orchestrator.refresh_at(Group::Silver, wednesday()).await;

        assert_eq!(report.written, vec!["SILVER"]);
        assert!(report.failures.is_empty());
        assert_eq!(h.cache.get("SILVER").unwrap().source, "yahoo");
    }

    #[tokio::test]
    async fn energy_has_no_last_resort() {
        let mut registry = SourceRegistry::default();
        registry.set_sub_symbols(
            Group::Energy,
            vec![SubSymbolSources {
                symbol: "WTI".into(),
                sources: descriptors(&["yahoo:CL=F"]),
            }],
        );
        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_price()
            .times(1)
            .returning(|_| Err(Error::Transport("timeout".into())));

        let h = harness(registry, fetcher, FallbackConfig::default());
        let report = h.orchestrator.refresh_at(Group::Energy, saturday()).await;
        assert_eq!(report.status, CycleStatus::Completed);
        assert!(h.cache.get("WTI").is_none());
    }

    #[tokio::test]
    async fn crypto_stream_branch_reads_table_only() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Crypto, descriptors(&["stream:BTC=BTCUSDT,ETH=ETHUSDT"]));
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_fetch_price().times(0);
        fetcher.expect_fetch_basket().times(0);

        let h = harness(registry, fetcher, FallbackConfig::default());
        h.stream.record("BTCUSDT", 64250.5);

        let report = h.orchestrator.refresh_at(Group::Crypto, saturday()).await;
        assert_eq!(report.written, vec!["BTC"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Transient);
        assert_eq!(h.cache.get("BTC").unwrap().source, "stream");
        assert!(h.cache.get("ETH").is_none());
    }

    #[tokio::test]
    async fn crypto_basket_writes_each_symbol() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Crypto, descriptors(&["coingecko:BTC=bitcoin,ETH=ethereum"]));
        let mut fetcher = MockPriceFetcher::new();
        fetcher
            .expect_fetch_basket()
            .times(1)
            .returning(|_| Ok(vec![("BTC".into(), 64000.0), ("ETH".into(), 0.0)]));

        let h = harness(registry, fetcher, FallbackConfig::default());
        let report = h.orchestrator.refresh_at(Group::Crypto, wednesday()).await;

        assert_eq!(report.written, vec!["BTC"]);
        assert_eq!(report.failures[0].kind, FailureKind::Parse);
        assert_eq!(h.cache.get("BTC").unwrap().unit, crate::types::Unit::Usd);
    }

    #[tokio::test]
    async fn fx_writes_composite_key() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Fx, descriptors(&["frankfurter:usd/eur"]));
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_fetch_price().times(1).returning(|_| Ok(0.9184));

        let h = harness(registry, fetcher, FallbackConfig::default());
        h.orchestrator.refresh_at(Group::Fx, wednesday()).await;

        let rate = h.cache.get("FX_USD_EUR").unwrap();
        assert_eq!((rate.price, rate.unit), (0.9184, crate::types::Unit::Rate));
    }

    #[tokio::test]
    async fn overlapping_cycle_is_skipped() {
        let mut registry = SourceRegistry::default();
        registry.set_sources(Group::Fx, descriptors(&["erapi:USD/EUR"]));
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_fetch_price().times(0);

        let h = harness(registry, fetcher, FallbackConfig::default());
        let held = h.orchestrator.try_enter(Group::Fx).unwrap();
        let report = h.orchestrator.refresh_at(Group::Fx, wednesday()).await;
        assert_eq!(report.status, CycleStatus::Skipped);
        assert_eq!(h.cache.cursor(Group::Fx), 0);

        drop(held);
        assert!(h.orchestrator.try_enter(Group::Fx).is_some());
    }

    #[tokio::test]
    async fn missing_list_reports_no_sources() {
        let h = harness(SourceRegistry::default(), MockPriceFetcher::new(), FallbackConfig::default());
        let report = h.orchestrator.refresh_at(Group::Fx, wednesday()).await;
        assert_eq!(report.status, CycleStatus::NoSources);
    }
}
