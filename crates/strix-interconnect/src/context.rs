use strix_gpu::{CommandExecutor, GpuDevice};
use tracing::trace;

use crate::cached_view::SplitMappingPolicy;
use crate::dirty::DirtyManager;
use crate::engine;
use crate::memory::MemoryManager;
use crate::stats::InterconnectStats;

/// The slice of the CPU emulation core the interconnect depends on.
///
/// This is intentionally minimal; the core wraps its own trap handling and
/// only needs to expose the write-back barrier used before guest memory is
/// snapshot-copied on the split-mapping path.
pub trait CpuCore {
    /// Ensure all pending guest CPU writes to `[address, address + size)`
    /// have reached the host-visible backing.
    fn drain_pending_writes(&self, address: u64, size: u64);
}

/// Per-channel translation configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub split_mapping_policy: SplitMappingPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            split_mapping_policy: SplitMappingPolicy::StagingCopy,
        }
    }
}

/// Long-lived per-channel state: the dirty table, telemetry, and the last
/// observed memory-manager invalidation epoch.
///
/// Owned and mutated only by the channel's processing thread.
pub struct ChannelContext {
    pub dirty: DirtyManager,
    pub stats: InterconnectStats,
    pub config: ChannelConfig,
    id: u32,
    last_invalidation_epoch: u64,
}

impl ChannelContext {
    pub fn new(id: u32, config: ChannelConfig) -> Self {
        Self {
            dirty: DirtyManager::new(engine::METHOD_COUNT),
            stats: InterconnectStats::new(),
            config,
            id,
            last_invalidation_epoch: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Reset channel-derived state, dropping all recorded dirtiness.
    pub fn reset(&mut self) {
        trace!(channel = self.id, "channel reset");
        self.dirty.clear();
    }

    /// Returns `true` when the memory manager invalidated mappings since the
    /// last observation. The caller must then call
    /// [`crate::CachedMappedBufferView::purge_caches`] on every cached view
    /// it owns before resolving anything through them.
    pub fn observe_invalidations(&mut self, memory: &dyn MemoryManager) -> bool {
        let epoch = memory.invalidation_epoch();
        if epoch != self.last_invalidation_epoch {
            trace!(
                channel = self.id,
                epoch,
                "guest mappings changed; mapped-view caches must be purged"
            );
            self.last_invalidation_epoch = epoch;
            true
        } else {
            false
        }
    }
}

/// Everything one translation operation needs, passed by reference.
///
/// Constructed per operation (typically one draw or one batch of register
/// writes) and never persisted beyond it.
pub struct InterconnectContext<'a> {
    pub channel: &'a mut ChannelContext,
    pub executor: &'a mut dyn CommandExecutor,
    pub gpu: &'a GpuDevice,
    pub cpu: &'a dyn CpuCore,
    pub memory: &'a dyn MemoryManager,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strix_gpu::GpuDevice;

    use crate::test_util::TestMemory;

    #[test]
    fn invalidations_are_observed_once_per_epoch() {
        let device = GpuDevice::new();
        let memory = TestMemory::new(&device, &[]);
        let mut channel = ChannelContext::new(0, ChannelConfig::default());

        assert!(!channel.observe_invalidations(&memory));

        memory.remap();
        assert!(channel.observe_invalidations(&memory));
        assert!(!channel.observe_invalidations(&memory));

        memory.remap();
        memory.remap();
        assert!(channel.observe_invalidations(&memory));
    }

    #[test]
    fn reset_clears_dirty_table() {
        let mut channel = ChannelContext::new(1, ChannelConfig::default());
        let handle = channel.dirty.register("viewport", 0x40, 8);

        channel.dirty.mark_dirty(0x40, 1);
        channel.reset();
        assert!(!channel.dirty.check_and_clear(handle));
    }
}
