use std::sync::Arc;

use crate::cache::GuardedCache;
use crate::config::SourceRegistry;
use crate::price_infra::SourceDescriptor;
use crate::types::Group;

/// Picks the next source for a rotated group from its persisted cursor.
pub struct RotationScheduler {
    registry: Arc<SourceRegistry>,
    cache: Arc<GuardedCache>,
}

impl RotationScheduler {
    pub fn new(registry: Arc<SourceRegistry>, cache: Arc<GuardedCache>) -> Self {
        RotationScheduler { registry, cache }
    }

    /// Source at the current cursor. The cursor always advances, whatever the
    /// outcome of the fetch that follows. `None` when the group has no list.
    pub fn pick_next(&self, group: Group) -> Option<SourceDescriptor> {
        let sources = self.registry.sources(group)?;
        let index = match self.cache.advance_cursor(group, sources.len()) {
            Ok(index) => index,
            Err(e) => {
                // in-memory cursor already moved; only the file is behind
                tracing::warn!(group = %group, error = %e, "Rotation cursor not persisted");
                (self.cache.cursor(group) + sources.len() - 1) % sources.len()
            }
        };
        let picked = sources[index].clone();
        tracing::debug!(group = %group, index, source = %picked, "Picked source");
        Some(picked)
    }
}
