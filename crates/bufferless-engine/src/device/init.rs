/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: shader outputs and the clear colour are written to a
    /// linear (`Unorm`) surface untouched, the way a plain GL framebuffer
    /// behaves. Turning it on brightens mid-tones such as the 0.5 grey.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is the only mode every backend guarantees.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Backends the instance may pick from.
    ///
    /// Defaults to the primary set (Vulkan, Metal, DX12). The fragment stage
    /// numbers triangles through a flat-interpolated vertex index, which
    /// needs the first vertex of each triangle to be the provoking one; GL
    /// drivers do not all follow that rule.
    pub backends: wgpu::Backends,

    /// Required wgpu features. The buffer-free pipeline needs none.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: Some(wgpu::CompositeAlphaMode::Opaque),
            backends: wgpu::Backends::PRIMARY,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
