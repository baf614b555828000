//! Window creation and event handling via winit.
//!
//! Provides [`OrreryApp`] which implements winit's [`ApplicationHandler`]
//! trait, and a [`run`] function to start the event loop.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use orrery_config::Config;
use orrery_render::{
    DepthBuffer, FrameEncoder, RenderPassBuilder, SPACE_BLACK, SurfaceError,
    init_render_context_blocking,
};
use orrery_scene::Scene;

use crate::frame_timer::FrameTimer;
use crate::scene_renderer::SceneRenderer;

/// Frames between periodic frame-stat log lines.
const FRAME_LOG_INTERVAL: u64 = 300;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let mut attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    attrs
}

/// Build the scene, applying the configured camera and orbit overrides on
/// top of the fixed solar constants.
pub fn scene_from_config(config: &Config) -> Scene {
    let mut scene = Scene::solar();
    scene.camera.fov_y = config.render.fov_y_degrees.to_radians();
    scene.camera.near = config.render.near_plane;
    scene.camera.far = config.render.far_plane;
    if let Some(orbit) = scene.earth.orbit.as_mut() {
        orbit.radius = config.scene.earth_orbit_radius;
        orbit.angular_speed = config.scene.earth_orbit_speed;
    }
    scene
}

/// Application state that manages the window, GPU context, and scene.
///
/// Everything GPU-backed is `None` until the winit `resumed` callback; the
/// first `RedrawRequested` after that starts the render loop, which keeps
/// itself alive by requesting the next redraw at the end of each frame.
/// Closing the window exits the event loop.
pub struct OrreryApp {
    /// The window handle, wrapped in `Arc` for sharing with the renderer.
    pub window: Option<Arc<Window>>,
    /// GPU context owning device, queue, and surface.
    pub gpu: Option<orrery_render::RenderContext>,
    /// Depth buffer matching the surface dimensions.
    pub depth_buffer: Option<DepthBuffer>,
    /// GPU-side scene resources.
    pub renderer: Option<SceneRenderer>,
    /// Scene state: bodies, camera, light, clock.
    pub scene: Scene,
    /// Wall-clock frame timing.
    pub frame_timer: FrameTimer,
    /// Application configuration.
    pub config: Config,
}

impl OrreryApp {
    /// Creates an `OrreryApp` with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an `OrreryApp` from a [`Config`].
    pub fn with_config(config: Config) -> Self {
        let scene = scene_from_config(&config);
        Self {
            window: None,
            gpu: None,
            depth_buffer: None,
            renderer: None,
            scene,
            frame_timer: FrameTimer::new(),
            config,
        }
    }
}

impl Default for OrreryApp {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let attrs = window_attributes_from_config(&self.config);
            let window = event_loop
                .create_window(attrs)
                .expect("Failed to create window");
            let window = Arc::new(window);

            match init_render_context_blocking(window.clone()) {
                Ok(gpu) => {
                    let depth_buffer = DepthBuffer::new(
                        &gpu.device,
                        gpu.surface_config.width,
                        gpu.surface_config.height,
                    );
                    match SceneRenderer::new(
                        &gpu.device,
                        &gpu.queue,
                        gpu.surface_format,
                        &self.scene,
                        &self.config.scene.asset_dir,
                    ) {
                        Ok(renderer) => {
                            self.depth_buffer = Some(depth_buffer);
                            self.renderer = Some(renderer);
                            self.gpu = Some(gpu);
                        }
                        Err(e) => {
                            error!("Scene renderer initialization failed: {e}");
                            event_loop.exit();
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("GPU initialization failed: {e}");
                    event_loop.exit();
                    return;
                }
            }

            self.window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let (w, h) = (new_size.width, new_size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(w, h);
                }
                if let (Some(depth_buffer), Some(gpu)) = (&mut self.depth_buffer, &self.gpu) {
                    depth_buffer.resize(&gpu.device, w, h);
                }
                info!("Window resized to {w}x{h}");
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // Pick up the new physical size from the window after the
                // scale change.
                if let Some(window) = &self.window {
                    let new_inner = window.inner_size();
                    let (w, h) = (new_inner.width, new_inner.height);
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(w, h);
                    }
                    if let (Some(depth_buffer), Some(gpu)) = (&mut self.depth_buffer, &self.gpu) {
                        depth_buffer.resize(&gpu.device, w, h);
                    }
                    info!("Scale factor changed to {scale_factor:.2}, resized to {w}x{h}");
                }
            }
            WindowEvent::RedrawRequested => {
                let delta = self.frame_timer.tick();
                self.scene.update(delta * self.config.scene.time_scale);

                if self.frame_timer.frame_count().is_multiple_of(FRAME_LOG_INTERVAL) {
                    info!(
                        "Frame {} at t={:.1}s (delta {:.1}ms)",
                        self.frame_timer.frame_count(),
                        self.scene.clock.elapsed_seconds(),
                        delta * 1000.0
                    );
                }

                if let (Some(gpu), Some(renderer), Some(depth_buffer)) =
                    (&self.gpu, &self.renderer, &self.depth_buffer)
                {
                    renderer.update(&gpu.queue, &self.scene, gpu.aspect_ratio());

                    match gpu.get_current_texture() {
                        Ok(surface_texture) => {
                            let mut frame_encoder = FrameEncoder::new(
                                &gpu.device,
                                Arc::new(gpu.queue.clone()),
                                surface_texture,
                            );

                            let pass_builder = RenderPassBuilder::new()
                                .clear_color(SPACE_BLACK)
                                .depth(depth_buffer.view.clone(), DepthBuffer::CLEAR_VALUE)
                                .label("solar-scene-pass");
                            {
                                let mut pass = frame_encoder.begin_render_pass(&pass_builder);
                                renderer.render(&mut pass);
                            }

                            frame_encoder.submit();
                        }
                        Err(SurfaceError::Lost) => {
                            let (w, h) = (gpu.surface_config.width, gpu.surface_config.height);
                            if let Some(gpu) = &mut self.gpu {
                                gpu.resize(w, h);
                            }
                        }
                        Err(SurfaceError::OutOfMemory) => {
                            error!("GPU out of memory");
                            event_loop.exit();
                        }
                        Err(SurfaceError::Timeout) => {
                            warn!("Surface timeout, skipping frame");
                        }
                    }
                }

                // Apply any textures that finished decoding; they bind from
                // the next frame on.
                if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
                    renderer.poll_texture_results(&gpu.device, &gpu.queue);
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Creates an event loop and runs the application with default config.
///
/// This function blocks until the window is closed.
#[instrument]
pub fn run() {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = OrreryApp::new();
    event_loop.run_app(&mut app).expect("Event loop failed");
}

/// Creates an event loop and runs the application with the given config.
///
/// This function blocks until the window is closed.
#[instrument(skip(config))]
pub fn run_with_config(config: Config) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = OrreryApp::with_config(config);
    event_loop.run_app(&mut app).expect("Event loop failed");
}
