use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::buffer::{Buffer, BufferId, BufferUsage, BufferView};

/// Handle to the host graphics device.
///
/// Buffer objects created here are bookkeeping handles; the native API
/// objects they stand for are owned and kept alive by the backend. The
/// device hands out unique ids so the rest of the stack can refer to buffers
/// without holding native objects.
#[derive(Debug, Default)]
pub struct GpuDevice {
    next_buffer_id: AtomicU32,
}

impl GpuDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_buffer(
        &self,
        size: u64,
        usage: BufferUsage,
        label: Option<&'static str>,
    ) -> Arc<Buffer> {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        Arc::new(Buffer::new(id, size, usage, label, None))
    }

    /// Create a staging buffer initialized with `contents` and return a view
    /// covering all of it.
    ///
    /// Staging buffers carry every bindable usage: a snapshot of a guest
    /// range can end up bound as vertex, index, or transform feedback data.
    pub fn create_staging_buffer(&self, contents: &[u8]) -> BufferView {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let size = contents.len() as u64;
        trace!(id = id.0, size, "creating staging buffer");
        let usage = BufferUsage::STAGING
            | BufferUsage::VERTEX
            | BufferUsage::INDEX
            | BufferUsage::TRANSFORM_FEEDBACK;
        let buffer = Arc::new(Buffer::new(
            id,
            size,
            usage,
            Some("staging"),
            Some(contents.into()),
        ));
        BufferView::new(buffer, 0, size)
    }
}
