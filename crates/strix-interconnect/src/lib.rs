//! Translation core between the emulated GPU's register-addressed command
//! processor and the host graphics backend.
//!
//! An external register decoder writes method words into the register file
//! and marks the ranges it touched via the [`DirtyManager`]. Before each
//! draw, the interconnect asks each named binding whether its registers
//! changed ([`DirtyManager::check_and_clear`]), re-resolves stale guest
//! buffer ranges through a [`CachedMappedBufferView`], and pushes the
//! resulting state into a [`StateUpdateBuilder`]. The builder defers
//! everything until [`StateUpdateBuilder::flush`], which submits the minimal
//! ordered command batch to the command executor ahead of the draw.
//!
//! All of this runs on the single thread that processes one GPU channel;
//! see [`DirtyManager`] and [`CachedMappedBufferView`] for the ownership
//! rules that follow from that.

mod builder;
mod cached_view;
mod context;
mod dirty;
mod memory;
mod stats;

pub mod engine;

pub use builder::{DynamicBufferBinding, FlushMetrics, StateUpdateBuilder};
pub use cached_view::{CachedMappedBufferView, SplitMappingPolicy};
pub use context::{ChannelConfig, ChannelContext, CpuCore, InterconnectContext};
pub use dirty::{BindingHandle, DirtyManager};
pub use memory::{MappingBlock, MemoryError, MemoryManager};
pub use stats::{InterconnectStats, InterconnectStatsSnapshot};

#[cfg(test)]
mod test_util;
