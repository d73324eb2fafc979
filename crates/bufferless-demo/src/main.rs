//! Draws two triangles without a vertex buffer.
//!
//! Positions come from the vertex index, green from the primitive index and
//! the blue bands from the fragment's height on screen.

mod demo;

use bufferless_engine::device::GpuInit;
use bufferless_engine::logging::{init_logging, LoggingConfig};
use bufferless_engine::window::Runtime;

use demo::{BufferlessDemo, DemoConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();
    let window = config.window.clone();

    Runtime::run(window, GpuInit::default(), BufferlessDemo::new(config))
}
