use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};

use super::LoopState;

/// Window configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub size: LogicalSize<f64>,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            size: LogicalSize::new(width, height),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Look Ma! No vertex buffer!", 800.0, 600.0)
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, drives `app` until the window closes, and tears
    /// everything down.
    ///
    /// Returns the first error raised while creating the window or GPU
    /// context or by an app callback; `Ok` means a normal close.
    pub fn run<A>(config: WindowConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        let result = event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error");

        let outcome = state.finish();
        result?;
        outcome
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: WindowConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    state: LoopState,
    frames: u64,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: WindowConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            state: LoopState::Running,
            frames: 0,
            failure: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        log::info!(
            "window \"{}\" created ({}x{} physical)",
            self.config.title,
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed")
            },
        }
        .try_build()
    }

    /// Runs app teardown (once) and drops the window and its GPU context.
    ///
    /// `on_shutdown` always runs before the GPU context goes away.
    fn shutdown(&mut self) {
        if self.state.request_close() {
            log::info!("closing after {} frames", self.frames);
            self.app.on_shutdown();
        }
        self.window = None;
    }

    /// Keeps the first error and shuts down.
    fn record_failure(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        self.shutdown();
    }

    /// Books the outcome of one `on_frame` call. Returns `true` when the
    /// loop has to stop.
    fn frame_done(&mut self, result: Result<AppControl>) -> bool {
        match result {
            Ok(control) => {
                if self.frames == 0 {
                    log::debug!("first frame rendered");
                }
                self.frames += 1;
                if control == AppControl::Exit {
                    self.shutdown();
                    return true;
                }
                false
            }
            Err(err) => {
                let err = err.context(format!("frame {} failed", self.frames));
                self.record_failure(err);
                true
            }
        }
    }

    /// Final teardown once the loop has returned. A no-op shutdown after a
    /// normal close; covers the loop ending some other way.
    fn finish(mut self) -> Result<()> {
        self.shutdown();
        match self.failure.take() {
            Some(err) => Err(err),
            None => {
                log::info!("exited cleanly after {} frames", self.frames);
                Ok(())
            }
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown();
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.record_failure(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let app = &mut self.app;
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        let result = entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    window: fields.window,
                },
                gpu: fields.gpu,
            };
            app.on_frame(&mut ctx)
        });

        if self.frame_done(result) {
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.state.should_close() {
            return;
        }

        let entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(err) => {
                self.fail(event_loop, err);
                return;
            }
        };

        let app = &mut self.app;
        if let Err(err) = entry.with_gpu(|gpu| app.on_gpu_ready(gpu)) {
            // The entry still owns the GPU context; keep it until teardown.
            self.window = Some(entry);
            self.fail(event_loop, err);
            return;
        }

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.should_close() {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation (FIFO) paces the loop.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.state.should_close() {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.window.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.close(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.close(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                log::debug!("resized to {}x{}", new_size.width, new_size.height);
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
