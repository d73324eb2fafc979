use anyhow::{Context, Result};
use bufferless_engine::core::{App, AppControl, FrameCtx};
use bufferless_engine::device::Gpu;
use bufferless_engine::render::{BufferlessRenderer, CLEAR_GREY};
use bufferless_engine::window::WindowConfig;

/// Fixed settings of the demo.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub clear: wgpu::Color,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear: CLEAR_GREY,
        }
    }
}

/// Clears to grey and draws the buffer-free quad every frame.
pub struct BufferlessDemo {
    config: DemoConfig,
    renderer: Option<BufferlessRenderer>,
}

impl BufferlessDemo {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            renderer: None,
        }
    }
}

impl App for BufferlessDemo {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let renderer = BufferlessRenderer::new(gpu.device(), gpu.surface_format())
            .context("failed to build the shader pipeline")?;

        let call = renderer.draw_call();
        log::info!(
            "drawing {} vertices as {:?} ({} triangles), no vertex buffer",
            call.vertex_count,
            call.topology,
            call.triangle_count()
        );

        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let renderer = self
            .renderer
            .as_mut()
            .context("frame requested before the shader pipeline was built")?;

        ctx.render(self.config.clear, |rctx, target| {
            renderer.draw(rctx, target)?;
            Ok(())
        })
    }

    fn on_shutdown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release();
        }
    }
}
