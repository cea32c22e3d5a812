//! Backend-agnostic fixed-function state types.
//!
//! These mirror explicit-API semantics without referencing any native API
//! type, so pending state can be built and inspected on the CPU and encoded
//! by whichever backend records the final command stream.

use bitflags::bitflags;

/// Backend-agnostic index format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// Floating-point viewport transform for one viewport index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Integer scissor rectangle for one viewport index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

bitflags! {
    /// Which stencil faces a state update applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StencilFaceFlags: u32 {
        const FRONT = 1 << 0;
        const BACK = 1 << 1;
        const FRONT_AND_BACK = Self::FRONT.bits() | Self::BACK.bits();
    }
}
