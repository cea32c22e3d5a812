use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

/// Lightweight handle into the device's buffer table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

bitflags! {
    /// Ways a host buffer may be bound by the translation layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const TRANSFORM_FEEDBACK = 1 << 2;
        const STAGING = 1 << 3;
    }
}

/// A host buffer handle.
///
/// This is bookkeeping only: the native API object it stands for is owned by
/// the backend. What the translation layer needs from a buffer is its
/// identity, its size, and the sequenced-write guard below.
pub struct Buffer {
    id: BufferId,
    size: u64,
    usage: BufferUsage,
    label: Option<&'static str>,
    contents: Option<Box<[u8]>>,
    sequenced_write_blocks: AtomicU64,
}

impl Buffer {
    pub(crate) fn new(
        id: BufferId,
        size: u64,
        usage: BufferUsage,
        label: Option<&'static str>,
        contents: Option<Box<[u8]>>,
    ) -> Self {
        Self {
            id,
            size,
            usage,
            label,
            contents,
            sequenced_write_blocks: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    /// Initial contents uploaded at creation, if any (staging snapshots).
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Prevents sequenced CPU writes from being applied directly to this
    /// buffer's host-visible backing while GPU work referencing it is
    /// outstanding.
    ///
    /// Must be invoked before any resolved view of this buffer is recorded
    /// into pending draw state. The block is lifted by the command executor
    /// once the referencing GPU work completes.
    pub fn block_sequenced_cpu_backing_writes(&self) {
        self.sequenced_write_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sequenced_cpu_backing_writes_blocked(&self) -> bool {
        self.sequenced_write_blocks.load(Ordering::Relaxed) > 0
    }

    /// Number of times the sequenced-write guard was taken on this buffer.
    pub fn sequenced_write_block_calls(&self) -> u64 {
        self.sequenced_write_blocks.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("usage", &self.usage)
            .field("label", &self.label)
            .finish()
    }
}

/// A sub-range of a [`Buffer`], produced by resolving a guest address range.
#[derive(Clone, Debug)]
pub struct BufferView {
    buffer: Arc<Buffer>,
    offset: u64,
    size: u64,
}

impl BufferView {
    /// Create a view over `[offset, offset + size)` of `buffer`.
    ///
    /// The range must lie within the buffer.
    pub fn new(buffer: Arc<Buffer>, offset: u64, size: u64) -> Self {
        debug_assert!(
            offset.checked_add(size).is_some_and(|end| end <= buffer.size()),
            "buffer view out of bounds: offset={offset} size={size} buffer_size={}",
            buffer.size()
        );
        Self {
            buffer,
            offset,
            size,
        }
    }

    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The static descriptor equivalent of this view.
    pub fn binding(&self) -> BufferBinding {
        BufferBinding {
            buffer: self.buffer.id(),
            offset: self.offset,
            size: self.size,
        }
    }
}

/// Static buffer binding descriptor: buffer identity plus a byte range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferBinding {
    pub buffer: BufferId,
    pub offset: u64,
    pub size: u64,
}
