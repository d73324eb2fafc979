use crate::pipeline::{reference, FramebufferUniform, PipelineError, ShaderPipeline, TOPOLOGY};
use crate::render::{RenderCtx, RenderTarget};

/// Neutral grey the frame is cleared to before drawing.
pub const CLEAR_GREY: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

/// A non-indexed draw with no vertex buffers bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub topology: wgpu::PrimitiveTopology,
}

impl DrawCall {
    /// Four implicit vertices as a triangle strip: the two-triangle quad.
    pub const QUAD_STRIP: Self = Self {
        vertex_count: 4,
        instance_count: 1,
        topology: TOPOLOGY,
    };

    /// Triangles rasterized by this call.
    pub fn triangle_count(&self) -> u32 {
        let per_instance = match self.topology {
            wgpu::PrimitiveTopology::TriangleStrip => {
                reference::strip_triangle_count(self.vertex_count)
            }
            wgpu::PrimitiveTopology::TriangleList => self.vertex_count / 3,
            _ => 0,
        };
        per_instance * self.instance_count
    }

    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw(0..self.vertex_count, 0..self.instance_count);
    }
}

struct Bindings {
    framebuffer_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    last_uniform: Option<FramebufferUniform>,
}

/// Draws the two-triangle quad with the buffer-free shader pipeline.
///
/// The only GPU buffer is the 16-byte framebuffer uniform the fragment stage
/// needs to measure y from the bottom edge.
pub struct BufferlessRenderer {
    pipeline: ShaderPipeline,
    bindings: Option<Bindings>,
    draw_call: DrawCall,
}

impl BufferlessRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, PipelineError> {
        let pipeline = ShaderPipeline::new(device, format)?;
        let layout = &pipeline.program()?.bind_group_layout;

        let framebuffer_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bufferless framebuffer ubo"),
            size: std::mem::size_of::<FramebufferUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bufferless bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: framebuffer_ubo.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            bindings: Some(Bindings {
                framebuffer_ubo,
                bind_group,
                last_uniform: None,
            }),
            draw_call: DrawCall::QUAD_STRIP,
        })
    }

    pub fn pipeline(&self) -> &ShaderPipeline {
        &self.pipeline
    }

    pub fn draw_call(&self) -> DrawCall {
        self.draw_call
    }

    /// Records the quad into `target`, on top of whatever it already holds.
    ///
    /// `ctx.surface_format` must be the format the program was linked for.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), PipelineError> {
        let Some(bindings) = self.bindings.as_mut() else {
            return Err(PipelineError::Released);
        };
        let linked = self.pipeline.program()?.target_format;
        if linked != ctx.surface_format {
            return Err(PipelineError::FormatMismatch {
                linked,
                target: ctx.surface_format,
            });
        }

        let uniform = FramebufferUniform::new(ctx.framebuffer.width, ctx.framebuffer.height);
        if bindings.last_uniform != Some(uniform) {
            ctx.queue
                .write_buffer(&bindings.framebuffer_ubo, 0, bytemuck::bytes_of(&uniform));
            bindings.last_uniform = Some(uniform);
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("bufferless pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        self.pipeline.bind(&mut rpass)?;
        rpass.set_bind_group(0, &bindings.bind_group, &[]);
        self.draw_call.record(&mut rpass);

        Ok(())
    }

    /// Releases the shader pipeline and the uniform. Idempotent.
    pub fn release(&mut self) -> bool {
        let had_bindings = self.bindings.take().is_some();
        self.pipeline.release() || had_bindings
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::device::headless::{headless_device, noop_device};

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    // 256 px * 4 bytes is already a multiple of COPY_BYTES_PER_ROW_ALIGNMENT.
    const WIDTH: u32 = 256;
    const HEIGHT: u32 = 200;

    #[test]
    fn quad_is_four_strip_vertices_two_triangles() {
        let call = DrawCall::QUAD_STRIP;
        assert_eq!(call.vertex_count, 4);
        assert_eq!(call.instance_count, 1);
        assert_eq!(call.topology, wgpu::PrimitiveTopology::TriangleStrip);
        assert_eq!(call.triangle_count(), 2);
    }

    #[test]
    fn triangle_count_by_topology() {
        let list = DrawCall {
            vertex_count: 6,
            instance_count: 2,
            topology: wgpu::PrimitiveTopology::TriangleList,
        };
        assert_eq!(list.triangle_count(), 4);

        let lines = DrawCall {
            topology: wgpu::PrimitiveTopology::LineStrip,
            ..DrawCall::QUAD_STRIP
        };
        assert_eq!(lines.triangle_count(), 0);
    }

    /// Clears, draws one frame offscreen and reads it back as RGBA8 rows.
    fn render_offscreen(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        renderer: &mut BufferlessRenderer,
    ) -> Vec<u8> {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size: wgpu::Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row = WIDTH * 4;
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen readback"),
            size: (bytes_per_row * HEIGHT) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("offscreen encoder"),
        });

        {
            let ctx = RenderCtx::new(device, queue, FORMAT, PhysicalSize::new(WIDTH, HEIGHT));
            let mut target = RenderTarget::new(&mut encoder, &view);
            target.clear(CLEAR_GREY);
            renderer.draw(&ctx, &mut target).unwrap();
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(HEIGHT),
                },
            },
            wgpu::Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });

        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let _ = device.poll(wgpu::PollType::Poll);
            if let Ok(result) = rx.try_recv() {
                result.expect("readback map failed");
                break;
            }
            assert!(Instant::now() < deadline, "readback timed out");
            std::thread::sleep(Duration::from_millis(1));
        }

        let pixels = readback.slice(..).get_mapped_range().to_vec();
        readback.unmap();
        pixels
    }

    fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = ((y * WIDTH + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    fn expected(primitive: u32, y: u32) -> [u8; 4] {
        // Pixel centers, measured from the bottom edge.
        let from_bottom = HEIGHT as f32 - (y as f32 + 0.5);
        reference::fragment_color(primitive, from_bottom).map(|c| (c * 255.0).round() as u8)
    }

    fn assert_close(actual: [u8; 4], expected: [u8; 4], what: &str) {
        for (a, e) in actual.iter().zip(expected) {
            assert!(a.abs_diff(e) <= 2, "{what}: got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn frame_matches_reference_formulas() {
        let Some((device, queue)) = headless_device() else { return };
        let mut renderer = BufferlessRenderer::new(&device, FORMAT).unwrap();

        let pixels = render_offscreen(&device, &queue, &mut renderer);

        // The quad covers clip space [0,1]x[0,1]: the top-right quarter.
        // Near its bottom-left corner -> first triangle.
        assert_close(pixel(&pixels, 140, 90), expected(0, 90), "first triangle");
        // Near its top-right corner -> second triangle.
        assert_close(pixel(&pixels, 250, 5), expected(1, 5), "second triangle");
        assert_close(pixel(&pixels, 250, 60), expected(1, 60), "second triangle, next band");

        // Outside the quad only the clear colour remains.
        assert_close(pixel(&pixels, 10, 190), [128, 128, 128, 255], "left half");
        assert_close(pixel(&pixels, 200, 150), [128, 128, 128, 255], "bottom half");
    }

    fn small_target(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[test]
    fn draw_records_on_matching_target() {
        let (device, queue) = noop_device();
        let mut renderer = BufferlessRenderer::new(&device, FORMAT).unwrap();

        let view = small_target(&device, FORMAT);
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let ctx = RenderCtx::new(&device, &queue, FORMAT, PhysicalSize::new(4, 4));
            let mut target = RenderTarget::new(&mut encoder, &view);
            target.clear(CLEAR_GREY);
            assert_eq!(renderer.draw(&ctx, &mut target), Ok(()));
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    #[test]
    fn draw_into_other_format_is_rejected() {
        let (device, queue) = noop_device();
        let mut renderer = BufferlessRenderer::new(&device, FORMAT).unwrap();

        let other = wgpu::TextureFormat::Bgra8Unorm;
        let view = small_target(&device, other);
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        let ctx = RenderCtx::new(&device, &queue, other, PhysicalSize::new(4, 4));
        let mut target = RenderTarget::new(&mut encoder, &view);
        assert_eq!(
            renderer.draw(&ctx, &mut target),
            Err(PipelineError::FormatMismatch {
                linked: FORMAT,
                target: other,
            })
        );
    }

    #[test]
    fn draw_after_release_is_rejected() {
        let (device, queue) = noop_device();
        let mut renderer = BufferlessRenderer::new(&device, FORMAT).unwrap();

        assert!(renderer.release());
        assert!(!renderer.release());
        assert!(renderer.pipeline().is_released());

        let view = small_target(&device, FORMAT);
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        let ctx = RenderCtx::new(&device, &queue, FORMAT, PhysicalSize::new(4, 4));
        let mut target = RenderTarget::new(&mut encoder, &view);
        assert_eq!(renderer.draw(&ctx, &mut target), Err(PipelineError::Released));
    }
}
