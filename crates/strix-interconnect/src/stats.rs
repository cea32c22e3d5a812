use std::sync::atomic::{AtomicU64, Ordering};

/// Telemetry counters for one channel's translation work.
///
/// Cheap to update on the channel thread and safe to read from a profiler
/// thread; all counters are relaxed.
#[derive(Debug, Default)]
pub struct InterconnectStats {
    view_cache_hits: AtomicU64,
    view_cache_misses: AtomicU64,
    split_mapping_resolutions: AtomicU64,
    flushes: AtomicU64,
    state_commands: AtomicU64,
}

impl InterconnectStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_view_cache_hits(&self) {
        self.view_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_view_cache_misses(&self) {
        self.view_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_split_mapping_resolutions(&self) {
        self.split_mapping_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_flushes(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_state_commands(&self, n: u64) {
        self.state_commands.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> InterconnectStatsSnapshot {
        InterconnectStatsSnapshot {
            view_cache_hits: self.view_cache_hits.load(Ordering::Relaxed),
            view_cache_misses: self.view_cache_misses.load(Ordering::Relaxed),
            split_mapping_resolutions: self.split_mapping_resolutions.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            state_commands: self.state_commands.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`InterconnectStats`], suitable for telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterconnectStatsSnapshot {
    pub view_cache_hits: u64,
    pub view_cache_misses: u64,
    pub split_mapping_resolutions: u64,
    pub flushes: u64,
    pub state_commands: u64,
}
