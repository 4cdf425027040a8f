use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Group, PriceRecord};

/// Whole-cache state as written to disk.
///
/// `#[serde(default)]` gives the shallow merge over compiled-in defaults: a
/// top-level key missing from the file keeps its default, a present key
/// replaces it entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub prices: BTreeMap<String, PriceRecord>,
    pub last_update: BTreeMap<String, DateTime<Utc>>,
    pub rotate_cursor: BTreeMap<String, usize>,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        CacheSnapshot {
            prices: BTreeMap::new(),
            last_update: BTreeMap::new(),
            rotate_cursor: Group::ALL
                .iter()
                .filter(|g| g.is_rotated())
                .map(|g| (g.as_str().to_string(), 0))
                .collect(),
        }
    }
}

impl CacheSnapshot {
    /// Load from `path`, falling back to defaults when the file is missing.
    ///
    /// A file that exists but cannot be parsed is reported as an error so the
    /// caller decides whether to start fresh.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No cache snapshot at {:?}, starting from defaults", path);
                return Ok(CacheSnapshot::default());
            }
            Err(e) => return Err(Error::IoError(e)),
        };

        let snapshot: CacheSnapshot = serde_json::from_slice(&data)
            .map_err(|e| Error::DeserializationError(e.to_string()))?;

        tracing::info!(
            "Loaded cache snapshot from {:?} with {} prices",
            path,
            snapshot.prices.len()
        );
        Ok(snapshot)
    }

    /// Rewrite the whole snapshot. Data goes to a sibling temp file that is then
    /// renamed over the target, so a crash mid-write leaves the previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::SerializationError(e.to_string()))?;

        let staging = staging_path(path);
        std::fs::write(&staging, data)?;
        std::fs::rename(&staging, path)?;

        tracing::trace!("Saved cache snapshot to {:?}", path);
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
