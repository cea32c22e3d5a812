//! Shared fixtures for crate-internal tests.

use std::cell::Cell;

use strix_gpu::{BufferUsage, BufferView, GpuDevice, RecordingExecutor};

use crate::context::{ChannelConfig, ChannelContext, CpuCore, InterconnectContext};
use crate::memory::{MappingBlock, MemoryError, MemoryManager};

/// Memory manager over a fixed set of mapping blocks.
///
/// Counts resolution queries so tests can assert the cache short-circuits
/// them, and serves `read` with the low byte of each guest address so staged
/// snapshots are recognizable.
pub(crate) struct TestMemory {
    blocks: Vec<MappingBlock>,
    resolve_calls: Cell<u64>,
    epoch: Cell<u64>,
}

impl TestMemory {
    pub fn new(device: &GpuDevice, ranges: &[(u64, u64)]) -> Self {
        let blocks = ranges
            .iter()
            .map(|&(start, end)| {
                let host = device.create_buffer(end - start, BufferUsage::all(), Some("guest"));
                MappingBlock {
                    start,
                    end,
                    host: BufferView::new(host, 0, end - start),
                }
            })
            .collect();
        Self {
            blocks,
            resolve_calls: Cell::new(0),
            epoch: Cell::new(0),
        }
    }

    pub fn resolve_calls(&self) -> u64 {
        self.resolve_calls.get()
    }

    /// Simulate a guest remap: bumps the invalidation epoch.
    pub fn remap(&self) {
        self.epoch.set(self.epoch.get() + 1);
    }
}

impl MemoryManager for TestMemory {
    fn resolve_mapping_block(&self, address: u64) -> Result<MappingBlock, MemoryError> {
        self.resolve_calls.set(self.resolve_calls.get() + 1);
        self.blocks
            .iter()
            .find(|b| b.start <= address && address < b.end)
            .cloned()
            .ok_or(MemoryError::NotMapped { address })
    }

    fn read(&self, address: u64, dst: &mut [u8]) -> Result<(), MemoryError> {
        let mut cursor = address;
        let end = address + dst.len() as u64;
        while cursor < end {
            let Some(block) = self
                .blocks
                .iter()
                .find(|b| b.start <= cursor && cursor < b.end)
            else {
                return Err(MemoryError::NotMapped { address: cursor });
            };
            let run_end = block.end.min(end);
            for a in cursor..run_end {
                dst[(a - address) as usize] = a as u8;
            }
            cursor = run_end;
        }
        Ok(())
    }

    fn invalidation_epoch(&self) -> u64 {
        self.epoch.get()
    }
}

pub(crate) struct CountingCpu {
    drains: Cell<u64>,
}

impl CountingCpu {
    pub fn new() -> Self {
        Self {
            drains: Cell::new(0),
        }
    }

    pub fn drains(&self) -> u64 {
        self.drains.get()
    }
}

impl CpuCore for CountingCpu {
    fn drain_pending_writes(&self, _address: u64, _size: u64) {
        self.drains.set(self.drains.get() + 1);
    }
}

/// Everything an interconnect operation needs, owned in one place.
pub(crate) struct Fixture {
    pub device: GpuDevice,
    pub memory: TestMemory,
    pub cpu: CountingCpu,
    pub executor: RecordingExecutor,
    pub channel: ChannelContext,
}

impl Fixture {
    pub fn new(ranges: &[(u64, u64)]) -> Self {
        Self::with_config(ranges, ChannelConfig::default())
    }

    pub fn with_config(ranges: &[(u64, u64)], config: ChannelConfig) -> Self {
        let device = GpuDevice::new();
        let memory = TestMemory::new(&device, ranges);
        Self {
            device,
            memory,
            cpu: CountingCpu::new(),
            executor: RecordingExecutor::new(),
            channel: ChannelContext::new(0, config),
        }
    }

    pub fn ctx(&mut self) -> InterconnectContext<'_> {
        InterconnectContext {
            channel: &mut self.channel,
            executor: &mut self.executor,
            gpu: &self.device,
            cpu: &self.cpu,
            memory: &self.memory,
        }
    }
}
