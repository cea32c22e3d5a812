//! Deferred host state-command representation.
//!
//! The interconnect layer accumulates per-draw state changes and submits
//! them here as an ordered command list. The format is not guest-visible; it
//! exists to decouple state derivation from backend encoding, so redundant
//! updates can be elided before any native API call is issued.

use crate::buffer::BufferBinding;
use crate::state::{IndexFormat, Rect2D, StencilFaceFlags, Viewport};

/// One deferred host state change.
#[derive(Clone, Debug, PartialEq)]
pub enum StateCommand {
    SetVertexBuffer {
        slot: u32,
        binding: BufferBinding,
    },
    SetIndexBuffer {
        binding: BufferBinding,
        format: IndexFormat,
    },
    SetTransformFeedbackBuffer {
        slot: u32,
        binding: BufferBinding,
    },
    SetViewport {
        index: u32,
        viewport: Viewport,
    },
    SetScissor {
        index: u32,
        rect: Rect2D,
    },
    SetLineWidth {
        width: f32,
    },
    SetDepthBias {
        constant_factor: f32,
        clamp: f32,
        slope_factor: f32,
    },
    SetBlendConstants {
        constants: [f32; 4],
    },
    SetDepthBounds {
        min: f32,
        max: f32,
    },
    SetStencilState {
        faces: StencilFaceFlags,
        reference: u32,
        compare_mask: u32,
        write_mask: u32,
    },
}

impl StateCommand {
    /// Whether this command binds a buffer range (as opposed to a plain
    /// fixed-function value update).
    pub fn is_buffer_binding(&self) -> bool {
        matches!(
            self,
            StateCommand::SetVertexBuffer { .. }
                | StateCommand::SetIndexBuffer { .. }
                | StateCommand::SetTransformFeedbackBuffer { .. }
        )
    }
}

/// A completed, ordered batch of deferred state commands for one draw.
///
/// Built by the interconnect's state update builder, handed to the command
/// executor at flush, and dropped once the corresponding draw is recorded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingState {
    commands: Vec<StateCommand>,
}

impl PendingState {
    pub fn new(commands: Vec<StateCommand>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[StateCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<StateCommand> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferId;

    #[test]
    fn buffer_binding_classification() {
        let binding = BufferBinding {
            buffer: BufferId(1),
            offset: 0,
            size: 16,
        };
        assert!(StateCommand::SetVertexBuffer { slot: 0, binding }.is_buffer_binding());
        assert!(!StateCommand::SetLineWidth { width: 1.0 }.is_buffer_binding());
    }
}
