//! `strix-gpu` contains the host-GPU-facing substrate shared by the strix
//! emulator's graphics stack.
//!
//! Currently this crate provides:
//! - Lightweight host buffer handles with the CPU/GPU write-ordering guard
//!   (see [`Buffer`]).
//! - Backend-agnostic fixed-function state types matching explicit-API
//!   semantics (see [`state`]).
//! - The deferred state-command representation consumed by the command
//!   executor at flush time (see [`cmd`]).
//! - The device handle used to create buffers and staging uploads (see
//!   [`GpuDevice`]).

mod buffer;
mod device;
mod executor;

pub mod cmd;
pub mod state;

pub use buffer::{Buffer, BufferBinding, BufferId, BufferUsage, BufferView};
pub use cmd::{PendingState, StateCommand};
pub use device::GpuDevice;
pub use executor::{CommandExecutor, DrawToken, RecordingExecutor};
