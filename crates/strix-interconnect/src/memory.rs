//! Guest address-space seam.
//!
//! The guest virtual-to-physical memory manager lives with the kernel
//! emulation; this module fixes the narrow interface the interconnect
//! consumes from it.

use strix_gpu::BufferView;
use thiserror::Error;

/// Errors surfaced while resolving guest buffer ranges.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// No host mapping backs the guest address.
    #[error("no host mapping backs guest address {address:#x}")]
    NotMapped { address: u64 },

    /// The range crosses mapping blocks and the channel is configured to
    /// reject split mappings rather than stage them.
    #[error("guest range {address:#x}..+{size:#x} spans multiple mapping blocks")]
    SplitMapping { address: u64, size: u64 },
}

/// Maximal contiguous guest-virtual range backed by one host mapping.
///
/// This is an address-keyed view handed out by the memory manager; the
/// mapping itself is owned there, never here.
#[derive(Clone, Debug)]
pub struct MappingBlock {
    /// First guest address covered by the block.
    pub start: u64,
    /// One past the last guest address covered by the block.
    pub end: u64,
    /// Host-visible range backing `[start, end)`.
    pub host: BufferView,
}

impl MappingBlock {
    /// Whether `[address, address + size)` lies entirely inside the block.
    pub fn contains_range(&self, address: u64, size: u64) -> bool {
        address >= self.start
            && address
                .checked_add(size)
                .is_some_and(|end| end <= self.end)
    }

    /// Synthesize a view over `[address, address + size)` from the block's
    /// host range. The range must satisfy [`Self::contains_range`].
    pub fn slice(&self, address: u64, size: u64) -> BufferView {
        debug_assert!(self.contains_range(address, size));
        debug_assert_eq!(self.end - self.start, self.host.size());
        BufferView::new(
            self.host.buffer().clone(),
            self.host.offset() + (address - self.start),
            size,
        )
    }
}

/// The slice of the guest memory manager the interconnect depends on.
pub trait MemoryManager {
    /// Resolve the mapping block containing `address`.
    fn resolve_mapping_block(&self, address: u64) -> Result<MappingBlock, MemoryError>;

    /// Copy guest bytes starting at `address` into `dst`, crossing mapping
    /// blocks as needed. Used to snapshot split ranges.
    fn read(&self, address: u64, dst: &mut [u8]) -> Result<(), MemoryError>;

    /// Monotonic counter bumped on every unmap/remap/resize.
    ///
    /// This is the invalidation registration for mapped-view caches: the
    /// channel records the epoch it last observed and turns a bump into
    /// explicit purges before the next resolution runs (see
    /// [`crate::ChannelContext::observe_invalidations`]).
    fn invalidation_epoch(&self) -> u64;
}
