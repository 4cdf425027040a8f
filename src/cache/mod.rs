pub mod snapshot;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::observability::metrics::{CACHE_PERSIST_FAILURES, PRICES_REJECTED};
use crate::types::price::is_valid_price;
use crate::types::{Group, PriceRecord, Unit};

pub use snapshot::CacheSnapshot;

/// Result of a guarded write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    /// Price was zero, negative or non-finite; the previous record is untouched.
    Rejected,
}

/// Persisted last-known-good prices plus rotation and freshness bookkeeping.
///
/// Every accepted mutation rewrites the full snapshot before returning. The
/// in-memory state is updated first, so a failed write still serves the new
/// value and the next successful write persists it.
pub struct GuardedCache {
    path: PathBuf,
    state: Mutex<CacheSnapshot>,
}

impl GuardedCache {
    /// Load the snapshot at `path`, or start from defaults when it is absent
    /// or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match CacheSnapshot::load(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Cache snapshot at {:?} unreadable, starting empty", path);
                CacheSnapshot::default()
            }
        };
        Ok(GuardedCache {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn get(&self, symbol: &str) -> Option<PriceRecord> {
        self.state.lock().prices.get(symbol).cloned()
    }

    /// Guarded write: only a positive finite price replaces the record.
    pub fn put(&self, symbol: &str, price: f64, unit: Unit, source: &str) -> Result<PutOutcome> {
        if !is_valid_price(price) {
            PRICES_REJECTED.inc();
            tracing::debug!(symbol, price, source, "Rejected invalid price");
            return Ok(PutOutcome::Rejected);
        }

        let mut state = self.state.lock();
        let now = Utc::now();
        let captured_at = match state.prices.get(symbol) {
            Some(prev) if prev.captured_at >= now => prev.captured_at + Duration::microseconds(1),
            _ => now,
        };

        state.prices.insert(
            symbol.to_string(),
            PriceRecord {
                symbol: symbol.to_string(),
                price,
                unit,
                source: source.to_string(),
                captured_at,
            },
        );
        self.persist(&state)?;
        Ok(PutOutcome::Stored)
    }

    /// Return the cursor for `group` wrapped into `[0, len)` and store its successor.
    pub fn advance_cursor(&self, group: Group, len: usize) -> Result<usize> {
        let mut state = self.state.lock();
        let key = group.as_str().to_string();
        let current = state.rotate_cursor.get(&key).copied().unwrap_or(0) % len.max(1);
        state.rotate_cursor.insert(key, (current + 1) % len.max(1));
        self.persist(&state)?;
        Ok(current)
    }

    pub fn cursor(&self, group: Group) -> usize {
        self.state
            .lock()
            .rotate_cursor
            .get(group.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Stamp the group's last update. The stamp only ever moves forward.
    pub fn touch(&self, group: Group) -> Result<()> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let entry = state.last_update.entry(group.as_str().to_string()).or_insert(now);
        if *entry < now {
            *entry = now;
        }
        self.persist(&state)
    }

    pub fn last_update(&self, group: Group) -> Option<DateTime<Utc>> {
        self.state.lock().last_update.get(group.as_str()).copied()
    }

    /// Drop every price. Rotation cursors and last-update stamps are kept.
    pub fn clear(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let removed = state.prices.len();
        state.prices.clear();
        self.persist(&state)?;
        tracing::info!("Cleared {} cached prices", removed);
        Ok(removed)
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.state.lock().clone()
    }

    pub fn save(&self) -> Result<()> {
        let state = self.state.lock();
        self.persist(&state)
    }

    fn persist(&self, state: &CacheSnapshot) -> Result<()> {
        state.save(&self.path).inspect_err(|e| {
            CACHE_PERSIST_FAILURES.inc();
            tracing::error!(error = %e, "Failed to persist cache snapshot to {:?}", self.path);
        })
    }
}
