//! Mapped buffer view caching.
//!
//! Resolving a guest address into a host buffer range means walking the
//! memory manager's address space, which costs far more than the register
//! writes that move buffer pointers around. Each logical binding slot owns
//! one [`CachedMappedBufferView`]; as long as the requested range stays
//! inside the mapping block resolved last time, the view is re-synthesized
//! from the cached block bounds without consulting the memory manager.
//!
//! Block caches are only ever invalidated explicitly: the memory manager's
//! unmap/remap path drives [`CachedMappedBufferView::purge_caches`] (via
//! [`crate::ChannelContext::observe_invalidations`]). Address comparison
//! alone can never prove a cached block stale, because the guest may remap
//! the same range to different backing.

use strix_gpu::BufferView;
use tracing::warn;

use crate::context::InterconnectContext;
use crate::memory::{MappingBlock, MemoryError};

/// How to resolve a range that spans multiple mapping blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMappingPolicy {
    /// Snapshot the range through the memory manager into a fresh staging
    /// buffer. The copy is coherent with guest CPU writes (the CPU core's
    /// write-back is drained first) but not with later ones.
    StagingCopy,
    /// Propagate [`MemoryError::SplitMapping`] to the caller.
    Deny,
}

/// A host buffer view resolved from a guest address range, cached against
/// the mapping block that produced it.
#[derive(Debug, Default)]
pub struct CachedMappedBufferView {
    block: Option<MappingBlock>,
    /// The view produced by the last successful [`Self::update`]. `None`
    /// until the first resolution and after zero-size requests (the empty
    /// view).
    pub view: Option<BufferView>,
}

impl CachedMappedBufferView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `[address, address + size)` into [`Self::view`].
    ///
    /// Fast path: the range lies inside the cached mapping block and the
    /// view is synthesized from its bounds. Otherwise the memory manager is
    /// queried and the containing block re-cached. A range no single block
    /// covers is resolved per the channel's [`SplitMappingPolicy`] and,
    /// when `warn_on_split` is true, reported as a performance diagnostic.
    ///
    /// Zero-size requests resolve to the empty view without touching the
    /// cache. An unmapped address propagates
    /// [`MemoryError::NotMapped`] and leaves the cache unchanged.
    pub fn update(
        &mut self,
        ctx: &mut InterconnectContext<'_>,
        address: u64,
        size: u64,
        warn_on_split: bool,
    ) -> Result<(), MemoryError> {
        if size == 0 {
            self.view = None;
            return Ok(());
        }

        if let Some(block) = &self.block {
            if block.contains_range(address, size) {
                self.view = Some(block.slice(address, size));
                ctx.channel.stats.inc_view_cache_hits();
                return Ok(());
            }
        }
        ctx.channel.stats.inc_view_cache_misses();

        let block = ctx.memory.resolve_mapping_block(address)?;
        if block.contains_range(address, size) {
            self.view = Some(block.slice(address, size));
            self.block = Some(block);
            return Ok(());
        }

        // The range continues past the block that contains its start.
        if warn_on_split {
            warn!(
                address,
                size, "guest buffer range spans multiple mapping blocks; fast path disabled"
            );
        }
        ctx.channel.stats.inc_split_mapping_resolutions();
        match ctx.channel.config.split_mapping_policy {
            SplitMappingPolicy::Deny => Err(MemoryError::SplitMapping { address, size }),
            SplitMappingPolicy::StagingCopy => {
                ctx.cpu.drain_pending_writes(address, size);
                let mut contents = vec![0u8; size as usize];
                ctx.memory.read(address, &mut contents)?;
                self.view = Some(ctx.gpu.create_staging_buffer(&contents));
                // The start block is still a valid cache for future ranges
                // that do fit inside it.
                self.block = Some(block);
                Ok(())
            }
        }
    }

    /// Unconditionally drop the cached mapping block (and the view resolved
    /// from it), forcing the next [`Self::update`] to perform a full
    /// lookup regardless of address.
    ///
    /// Invoked from the memory manager's invalidation path on any
    /// unmap/remap/resize affecting this cache.
    pub fn purge_caches(&mut self) {
        self.block = None;
        self.view = None;
    }
}
