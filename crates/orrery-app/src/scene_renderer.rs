//! GPU-side scene resources and per-frame drawing.
//!
//! [`SceneRenderer`] owns everything the scene needs on the device: the
//! sphere pipeline, the frame uniform buffer, and one slot per body holding
//! its mesh buffers, uniform buffer, and current texture. Meshes are
//! tessellated and uploaded once at startup; per-frame GPU traffic is
//! uniform writes only.
//!
//! Textures start as 1x1 white placeholders. Decode work runs on a
//! background worker; results are drained once per frame and swap the
//! slot's texture handle in place. A failed load keeps the placeholder.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use orrery_mesh::generate_sphere;
use orrery_render::{
    BodyUniforms, BufferAllocator, FrameUniforms, ManagedTexture, MeshBuffer, PipelineError,
    SpherePipeline, TextureError, TextureLoadPipeline, TextureLoadTask, TextureManager,
    draw_sphere,
};
use orrery_scene::Scene;

/// Decode worker threads. One thread keeps the two body images out of the
/// render thread without oversubscribing anything.
const TEXTURE_WORKERS: usize = 1;

/// Maximum in-flight decode tasks.
const TEXTURE_LOAD_BUDGET: usize = 8;

/// Errors that can occur while building the scene renderer.
#[derive(Debug, Error)]
pub enum SceneRendererError {
    /// The sphere pipeline failed to compile or link.
    #[error("failed to build sphere pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// A placeholder texture could not be created.
    #[error("failed to create texture: {0}")]
    Texture(#[from] TextureError),
}

/// Per-body GPU state, index-aligned with the scene's draw order.
struct BodySlot {
    /// Body name, matching texture-load results back to this slot.
    name: &'static str,
    /// Uploaded sphere geometry.
    mesh: MeshBuffer,
    /// Per-body uniform buffer (model-view, normal matrix, lighting flag).
    uniform_buffer: wgpu::Buffer,
    /// Bind group for `uniform_buffer` (group 2).
    bind_group: wgpu::BindGroup,
    /// Current texture: the placeholder until the decoded image arrives.
    texture: Arc<ManagedTexture>,
}

/// All GPU handles needed to draw the solar scene.
pub struct SceneRenderer {
    pipeline: SpherePipeline,
    frame_uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    texture_manager: TextureManager,
    loader: TextureLoadPipeline,
    bodies: Vec<BodySlot>,
}

impl SceneRenderer {
    /// Build the pipeline, upload every body's mesh, create placeholder
    /// textures, and queue the image decodes.
    ///
    /// Image paths are resolved as `asset_dir/<texture_file>`; a missing or
    /// corrupt file is reported later through [`poll_texture_results`]
    /// (Self::poll_texture_results) and the body keeps its placeholder.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
        asset_dir: &Path,
    ) -> Result<Self, SceneRendererError> {
        let mut texture_manager = TextureManager::new(device);
        let pipeline =
            SpherePipeline::new(device, surface_format, texture_manager.bind_group_layout())?;
        let allocator = BufferAllocator::new(device);

        let frame_uniforms = FrameUniforms::new(
            glam::Mat4::IDENTITY,
            scene.light.position,
            scene.light.ambient,
        );
        let frame_uniform_buffer =
            allocator.create_uniform("frame-uniforms", bytemuck::bytes_of(&frame_uniforms));
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &pipeline.frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_uniform_buffer.as_entire_binding(),
            }],
        });

        let loader = TextureLoadPipeline::new(TEXTURE_WORKERS, TEXTURE_LOAD_BUDGET);

        let mut bodies = Vec::new();
        for body in scene.bodies() {
            let sphere = generate_sphere(body.radius, body.lat_bands, body.long_bands);
            let mesh = allocator.create_sphere(&format!("{}-mesh", body.name), &sphere);

            let uniforms = BodyUniforms::new(glam::Mat4::IDENTITY, true);
            let uniform_buffer = allocator
                .create_uniform(&format!("{}-uniforms", body.name), bytemuck::bytes_of(&uniforms));
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{}-bind-group", body.name)),
                layout: &pipeline.body_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

            let texture = texture_manager.create_placeholder(device, queue, body.name)?;

            let task = TextureLoadTask {
                name: body.name.to_string(),
                path: asset_dir.join(body.texture_file),
            };
            if !loader.submit(task) {
                warn!("Texture load queue full, '{}' keeps its placeholder", body.name);
            }

            bodies.push(BodySlot {
                name: body.name,
                mesh,
                uniform_buffer,
                bind_group,
                texture,
            });
        }

        info!(
            "Scene renderer ready: {} bodies, textures loading from {:?}",
            bodies.len(),
            asset_dir
        );

        Ok(Self {
            pipeline,
            frame_uniform_buffer,
            frame_bind_group,
            texture_manager,
            loader,
            bodies,
        })
    }

    /// Write this frame's uniforms: the shared projection/light block and
    /// each body's model-view derived from the scene clock.
    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, aspect_ratio: f32) {
        let elapsed = scene.clock.elapsed_seconds() as f32;
        let view = scene.camera.view_matrix();
        let projection = scene.camera.projection_matrix(aspect_ratio);

        let frame_uniforms =
            FrameUniforms::new(projection, scene.light.position, scene.light.ambient);
        queue.write_buffer(
            &self.frame_uniform_buffer,
            0,
            bytemuck::bytes_of(&frame_uniforms),
        );

        for (slot, body) in self.bodies.iter().zip(scene.bodies()) {
            let model_view = view * body.model_matrix_at(elapsed);
            let uniforms = BodyUniforms::new(model_view, true);
            queue.write_buffer(&slot.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Draw every body in scene order with its current texture.
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        for slot in &self.bodies {
            draw_sphere(
                render_pass,
                &self.pipeline,
                &self.frame_bind_group,
                &slot.texture.bind_group,
                &slot.bind_group,
                &slot.mesh,
            );
        }
    }

    /// Drain completed texture decodes and swap them into their body slots.
    ///
    /// Returns the number of results processed. A decode or upload failure
    /// is logged and the body keeps its placeholder; there is no retry.
    pub fn poll_texture_results(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> usize {
        let results = self.loader.drain_results();
        let count = results.len();

        for result in results {
            match result.outcome {
                Ok(image) => {
                    let upload = self.texture_manager.replace_texture(
                        device,
                        queue,
                        &result.name,
                        &image.pixels,
                        image.width,
                        image.height,
                        wgpu::TextureFormat::Rgba8UnormSrgb,
                        true,
                    );
                    match upload {
                        Ok(managed) => {
                            info!(
                                "Texture '{}' loaded ({}x{})",
                                result.name, image.width, image.height
                            );
                            if let Some(slot) =
                                self.bodies.iter_mut().find(|s| s.name == result.name)
                            {
                                slot.texture = managed;
                            }
                        }
                        Err(e) => {
                            warn!(
                                "Texture upload for '{}' failed, keeping placeholder: {e}",
                                result.name
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Texture load for '{}' failed, keeping placeholder: {e}",
                        result.name
                    );
                }
            }
        }

        count
    }

    /// Number of decode tasks still in flight.
    pub fn pending_texture_loads(&self) -> usize {
        self.loader.in_flight_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok()?;

        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("scene-renderer-test-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .ok()
    }

    fn write_test_png(dir: &Path, name: &str, pixel: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(pixel));
        img.save(dir.join(name)).unwrap();
    }

    /// Poll until `expected` texture results have been processed, or fail
    /// after a timeout.
    fn wait_for_results(
        renderer: &mut SceneRenderer,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        expected: usize,
    ) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut processed = 0;
        while processed < expected {
            assert!(
                std::time::Instant::now() < deadline,
                "timed out waiting for {expected} texture results ({processed} seen)"
            );
            processed += renderer.poll_texture_results(device, queue);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_renderer_starts_with_placeholders() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let scene = Scene::solar();
        let renderer = SceneRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            &scene,
            Path::new("no-such-directory"),
        )
        .unwrap();

        assert_eq!(renderer.bodies.len(), 2);
        assert_eq!(renderer.bodies[0].name, "sun");
        assert_eq!(renderer.bodies[1].name, "earth");
        for slot in &renderer.bodies {
            assert_eq!(slot.texture.dimensions, (1, 1));
        }
    }

    #[test]
    fn test_missing_files_keep_placeholders() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let scene = Scene::solar();
        let mut renderer = SceneRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            &scene,
            Path::new("no-such-directory"),
        )
        .unwrap();

        wait_for_results(&mut renderer, &device, &queue, 2);

        for slot in &renderer.bodies {
            assert_eq!(
                slot.texture.dimensions,
                (1, 1),
                "'{}' should still bind its placeholder",
                slot.name
            );
        }
        assert_eq!(renderer.pending_texture_loads(), 0);
    }

    #[test]
    fn test_decoded_textures_replace_placeholders() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        write_test_png(dir.path(), "sun.png", [255, 200, 0, 255]);
        write_test_png(dir.path(), "earth.png", [0, 80, 200, 255]);

        let scene = Scene::solar();
        let mut renderer = SceneRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            &scene,
            dir.path(),
        )
        .unwrap();

        wait_for_results(&mut renderer, &device, &queue, 2);

        for slot in &renderer.bodies {
            assert_eq!(
                slot.texture.dimensions,
                (2, 2),
                "'{}' should bind the decoded image",
                slot.name
            );
            // 2x2 generates one extra mip level.
            assert_eq!(slot.texture.mip_level_count, 2);
        }

        // No further results arrive and the swap never reverts.
        assert_eq!(renderer.poll_texture_results(&device, &queue), 0);
        for slot in &renderer.bodies {
            assert_eq!(slot.texture.dimensions, (2, 2));
        }
    }

    #[test]
    fn test_update_writes_uniforms_without_panic() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut scene = Scene::solar();
        let renderer = SceneRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            &scene,
            Path::new("no-such-directory"),
        )
        .unwrap();

        scene.update(0.016);
        renderer.update(&queue, &scene, 16.0 / 9.0);
        scene.update(0.016);
        renderer.update(&queue, &scene, 16.0 / 9.0);
    }
}
