//! Surface-less devices for tests.

/// Requests a device with no surface attached.
///
/// Returns `None` on machines without any usable adapter (CI containers);
/// only tests that read pixels back should rely on this one.
pub(crate) fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    // GL is left out: not every GLES driver honours the first-vertex
    // provoking convention the fragment stage relies on.
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = match pollster::block_on(instance.request_adapter(
        &wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        },
    )) {
        Ok(adapter) => adapter,
        Err(err) => {
            log::warn!("no GPU adapter available, skipping: {err}");
            return None;
        }
    };

    pollster::block_on(adapter.request_device(&test_device_descriptor()))
        .map_err(|err| log::warn!("device request failed, skipping: {err}"))
        .ok()
}

/// Device on wgpu's no-op backend.
///
/// Always available. Resource creation, validation and command recording
/// behave as on a real backend; nothing is ever rasterized.
pub(crate) fn noop_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::NOOP,
        backend_options: wgpu::BackendOptions {
            noop: wgpu::NoopBackendOptions { enable: true },
            ..Default::default()
        },
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
        .expect("noop adapter");
    pollster::block_on(adapter.request_device(&test_device_descriptor())).expect("noop device")
}

fn test_device_descriptor() -> wgpu::DeviceDescriptor<'static> {
    wgpu::DeviceDescriptor {
        label: Some("bufferless test device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
    }
}
