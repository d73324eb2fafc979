//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to the
//! GPU layer and the [`App`](crate::core::App).

mod runtime;
mod state;

pub use runtime::{Runtime, WindowConfig};
pub use state::LoopState;
