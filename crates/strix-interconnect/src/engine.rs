//! Method-space constants for the emulated 3D engine.
//!
//! The register layout itself (which method means what) lives with the
//! decoder; this module only fixes the sizes the interconnect is built
//! around.

/// Number of `u32` method slots in the engine's register file.
pub const METHOD_COUNT: usize = 0xE00;

/// Vertex buffer binding slots exposed by the engine.
pub const VERTEX_STREAM_COUNT: usize = 16;

/// Transform feedback buffer binding slots.
pub const TRANSFORM_FEEDBACK_BUFFER_COUNT: usize = 4;

/// Independent viewport/scissor indices.
pub const VIEWPORT_COUNT: usize = 16;

/// Channels in the blend-constants vector.
pub const BLEND_COLOR_CHANNEL_COUNT: usize = 4;
