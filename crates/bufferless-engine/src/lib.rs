//! Bufferless engine crate.
//!
//! Window runtime, GPU context, and a shader pipeline that draws geometry
//! synthesized entirely from built-in shader counters.

pub mod core;
pub mod device;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod window;
