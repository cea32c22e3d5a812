//! Deferred state accumulation.
//!
//! Register writes arrive far more often than draws, so nothing is pushed
//! to the host API as it changes. Setters record the latest value per slot;
//! [`StateUpdateBuilder::flush`] turns whatever accumulated into one
//! ordered [`PendingState`] batch (one command per touched item) and
//! submits it to the command executor ahead of the draw.

use std::array;

use strix_gpu::state::{IndexFormat, Rect2D, StencilFaceFlags, Viewport};
use strix_gpu::{
    BufferBinding, BufferUsage, BufferView, DrawToken, PendingState, StateCommand,
};
use tracing::trace;

use crate::context::InterconnectContext;
use crate::engine;

/// A buffer-backed binding in either of its two forms: a static descriptor
/// supplied by the decoder, or a view resolved through the mapped-view
/// cache.
#[derive(Clone, Debug)]
pub enum DynamicBufferBinding {
    Binding(BufferBinding),
    View(BufferView),
}

impl DynamicBufferBinding {
    fn resolve(&self) -> BufferBinding {
        match self {
            DynamicBufferBinding::Binding(binding) => *binding,
            DynamicBufferBinding::View(view) => view.binding(),
        }
    }
}

/// Counts for one flush, mirroring the shape of the submitted batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushMetrics {
    pub commands: usize,
    pub buffer_bindings: u32,
    pub fixed_function_updates: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Accumulating,
    Flushed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StencilFaceState {
    reference: u32,
    compare_mask: u32,
    write_mask: u32,
}

/// Accumulates the minimal host state changes implied by current dirty
/// state.
///
/// Cycle: `Idle` → `Accumulating` on the first setter → `Flushed` by
/// [`Self::flush`] → `Idle` again via [`Self::reset`] once the executor has
/// recorded the draw. Setters after a flush are an internal ordering bug
/// and are caught by assertion.
///
/// For any one slot, a descriptor call and a view call are mutually
/// exclusive within a cycle; whichever came last wins.
pub struct StateUpdateBuilder {
    phase: Phase,
    vertex_buffers: [Option<DynamicBufferBinding>; engine::VERTEX_STREAM_COUNT],
    index_buffer: Option<(DynamicBufferBinding, IndexFormat)>,
    transform_feedback_buffers:
        [Option<DynamicBufferBinding>; engine::TRANSFORM_FEEDBACK_BUFFER_COUNT],
    viewports: [Option<Viewport>; engine::VIEWPORT_COUNT],
    scissors: [Option<Rect2D>; engine::VIEWPORT_COUNT],
    line_width: Option<f32>,
    depth_bias: Option<(f32, f32, f32)>,
    blend_constants: Option<[f32; engine::BLEND_COLOR_CHANNEL_COUNT]>,
    depth_bounds: Option<(f32, f32)>,
    stencil_front: Option<StencilFaceState>,
    stencil_back: Option<StencilFaceState>,
}

impl Default for StateUpdateBuilder {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            vertex_buffers: array::from_fn(|_| None),
            index_buffer: None,
            transform_feedback_buffers: array::from_fn(|_| None),
            viewports: array::from_fn(|_| None),
            scissors: array::from_fn(|_| None),
            line_width: None,
            depth_bias: None,
            blend_constants: None,
            depth_bounds: None,
            stencil_front: None,
            stencil_back: None,
        }
    }
}

impl StateUpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn accumulate(&mut self) {
        assert!(
            self.phase != Phase::Flushed,
            "state update builder used after flush without reset"
        );
        self.phase = Phase::Accumulating;
    }

    /// Take the sequenced-write guard on a view's buffer. Must happen
    /// before the binding is recorded, never after.
    fn guard_view(view: &BufferView, usage: BufferUsage) {
        view.buffer().block_sequenced_cpu_backing_writes();
        debug_assert!(
            view.buffer().usage().contains(usage),
            "buffer {:?} bound without {usage:?} usage",
            view.buffer().id()
        );
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, binding: BufferBinding) {
        self.accumulate();
        self.vertex_buffers[slot as usize] = Some(DynamicBufferBinding::Binding(binding));
    }

    pub fn set_vertex_buffer_view(&mut self, slot: u32, view: BufferView) {
        self.accumulate();
        Self::guard_view(&view, BufferUsage::VERTEX);
        self.vertex_buffers[slot as usize] = Some(DynamicBufferBinding::View(view));
    }

    pub fn set_index_buffer(&mut self, binding: BufferBinding, format: IndexFormat) {
        self.accumulate();
        self.index_buffer = Some((DynamicBufferBinding::Binding(binding), format));
    }

    pub fn set_index_buffer_view(&mut self, view: BufferView, format: IndexFormat) {
        self.accumulate();
        Self::guard_view(&view, BufferUsage::INDEX);
        self.index_buffer = Some((DynamicBufferBinding::View(view), format));
    }

    pub fn set_transform_feedback_buffer(&mut self, slot: u32, binding: BufferBinding) {
        self.accumulate();
        self.transform_feedback_buffers[slot as usize] =
            Some(DynamicBufferBinding::Binding(binding));
    }

    pub fn set_transform_feedback_buffer_view(&mut self, slot: u32, view: BufferView) {
        self.accumulate();
        Self::guard_view(&view, BufferUsage::TRANSFORM_FEEDBACK);
        self.transform_feedback_buffers[slot as usize] = Some(DynamicBufferBinding::View(view));
    }

    pub fn set_viewport(&mut self, index: u32, viewport: Viewport) {
        self.accumulate();
        self.viewports[index as usize] = Some(viewport);
    }

    pub fn set_scissor(&mut self, index: u32, rect: Rect2D) {
        self.accumulate();
        self.scissors[index as usize] = Some(rect);
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.accumulate();
        self.line_width = Some(width);
    }

    pub fn set_depth_bias(&mut self, constant_factor: f32, clamp: f32, slope_factor: f32) {
        self.accumulate();
        self.depth_bias = Some((constant_factor, clamp, slope_factor));
    }

    pub fn set_blend_constants(
        &mut self,
        constants: [f32; engine::BLEND_COLOR_CHANNEL_COUNT],
    ) {
        self.accumulate();
        self.blend_constants = Some(constants);
    }

    pub fn set_depth_bounds(&mut self, min: f32, max: f32) {
        self.accumulate();
        self.depth_bounds = Some((min, max));
    }

    pub fn set_stencil_state(
        &mut self,
        faces: StencilFaceFlags,
        reference: u32,
        compare_mask: u32,
        write_mask: u32,
    ) {
        self.accumulate();
        let state = StencilFaceState {
            reference,
            compare_mask,
            write_mask,
        };
        if faces.contains(StencilFaceFlags::FRONT) {
            self.stencil_front = Some(state);
        }
        if faces.contains(StencilFaceFlags::BACK) {
            self.stencil_back = Some(state);
        }
    }

    /// Submit everything accumulated this cycle to the command executor as
    /// one ordered batch, correlated with `token`.
    ///
    /// Must run strictly after all setter calls for the draw and strictly
    /// before the executor records it. An empty batch is still submitted so
    /// the executor sees every token.
    pub fn flush(&mut self, ctx: &mut InterconnectContext<'_>, token: DrawToken) -> FlushMetrics {
        assert!(
            self.phase != Phase::Flushed,
            "state update builder flushed twice without reset"
        );

        let mut commands = Vec::new();
        for (slot, pending) in self.vertex_buffers.iter_mut().enumerate() {
            if let Some(binding) = pending.take() {
                commands.push(StateCommand::SetVertexBuffer {
                    slot: slot as u32,
                    binding: binding.resolve(),
                });
            }
        }
        if let Some((binding, format)) = self.index_buffer.take() {
            commands.push(StateCommand::SetIndexBuffer {
                binding: binding.resolve(),
                format,
            });
        }
        for (slot, pending) in self.transform_feedback_buffers.iter_mut().enumerate() {
            if let Some(binding) = pending.take() {
                commands.push(StateCommand::SetTransformFeedbackBuffer {
                    slot: slot as u32,
                    binding: binding.resolve(),
                });
            }
        }
        let buffer_bindings = commands.len() as u32;

        for (index, pending) in self.viewports.iter_mut().enumerate() {
            if let Some(viewport) = pending.take() {
                commands.push(StateCommand::SetViewport {
                    index: index as u32,
                    viewport,
                });
            }
        }
        for (index, pending) in self.scissors.iter_mut().enumerate() {
            if let Some(rect) = pending.take() {
                commands.push(StateCommand::SetScissor {
                    index: index as u32,
                    rect,
                });
            }
        }
        if let Some(width) = self.line_width.take() {
            commands.push(StateCommand::SetLineWidth { width });
        }
        if let Some((constant_factor, clamp, slope_factor)) = self.depth_bias.take() {
            commands.push(StateCommand::SetDepthBias {
                constant_factor,
                clamp,
                slope_factor,
            });
        }
        if let Some(constants) = self.blend_constants.take() {
            commands.push(StateCommand::SetBlendConstants { constants });
        }
        if let Some((min, max)) = self.depth_bounds.take() {
            commands.push(StateCommand::SetDepthBounds { min, max });
        }
        self.flush_stencil(&mut commands);

        let metrics = FlushMetrics {
            commands: commands.len(),
            buffer_bindings,
            fixed_function_updates: commands.len() as u32 - buffer_bindings,
        };
        trace!(
            commands = metrics.commands,
            buffer_bindings = metrics.buffer_bindings,
            "flushing pending state"
        );
        ctx.channel.stats.inc_flushes();
        ctx.channel.stats.add_state_commands(metrics.commands as u64);

        self.phase = Phase::Flushed;
        ctx.executor.submit(PendingState::new(commands), token);
        metrics
    }

    fn flush_stencil(&mut self, commands: &mut Vec<StateCommand>) {
        let front = self.stencil_front.take();
        let back = self.stencil_back.take();
        match (front, back) {
            // Both faces with identical state collapse into one update.
            (Some(front), Some(back)) if front == back => {
                commands.push(Self::stencil_command(StencilFaceFlags::FRONT_AND_BACK, front));
            }
            (front, back) => {
                if let Some(front) = front {
                    commands.push(Self::stencil_command(StencilFaceFlags::FRONT, front));
                }
                if let Some(back) = back {
                    commands.push(Self::stencil_command(StencilFaceFlags::BACK, back));
                }
            }
        }
    }

    fn stencil_command(faces: StencilFaceFlags, state: StencilFaceState) -> StateCommand {
        StateCommand::SetStencilState {
            faces,
            reference: state.reference,
            compare_mask: state.compare_mask,
            write_mask: state.write_mask,
        }
    }

    /// Return to `Idle`, dropping anything accumulated but not flushed.
    /// Called once the executor has recorded the draw for the last flush.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
