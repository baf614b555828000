//! GPU pipeline for textured, lit sphere rendering.
//!
//! One pipeline draws every body in the scene. Bind group 0 carries the
//! per-frame uniforms (projection, light), group 1 the body's texture and
//! sampler (the [`TextureManager`](crate::TextureManager) layout, so a
//! finished texture load rebinds a cached entry directly), and group 2 the
//! per-body uniforms (model-view, normal matrix, lighting flag).

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::buffer::{MeshBuffer, VertexPositionNormalUv};
use crate::depth::DepthBuffer;

/// WGSL shader source for the textured, lit sphere.
///
/// The light position is compared against model-view-transformed fragment
/// positions without a space conversion; with the light at the origin the
/// effective illumination follows the camera. The unlit branch is kept for
/// backdrop elements even though every body currently lights.
pub const SPHERE_SHADER_SOURCE: &str = r#"
struct FrameUniforms {
    projection: mat4x4<f32>,
    light_position: vec3<f32>,
    ambient_light: vec3<f32>,
};

struct BodyUniforms {
    model_view: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    use_lighting: u32,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var t_surface: texture_2d<f32>;
@group(1) @binding(1)
var s_surface: sampler;

@group(2) @binding(0)
var<uniform> body: BodyUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) frag_position: vec3<f32>,
};

@vertex
fn vs_sphere(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let view_position = body.model_view * vec4<f32>(in.position, 1.0);
    out.clip_position = frame.projection * view_position;
    out.uv = in.uv;
    out.normal = (body.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.frag_position = view_position.xyz;
    return out;
}

@fragment
fn fs_sphere(in: VertexOutput) -> @location(0) vec4<f32> {
    let tex_color = textureSample(t_surface, s_surface, in.uv);

    if (body.use_lighting != 0u) {
        let normal = normalize(in.normal);
        let light_dir = normalize(frame.light_position - in.frag_position);
        let diff = max(dot(normal, light_dir), 0.0);

        let ambient = frame.ambient_light * tex_color.rgb;
        let diffuse = diff * tex_color.rgb;

        return vec4<f32>(ambient + diffuse, tex_color.a);
    } else {
        return tex_color;
    }
}
"#;

/// Per-frame GPU uniforms shared by every body: projection and light.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Projection matrix (column-major).
    pub projection: [[f32; 4]; 4],
    /// Light position as provided by the scene.
    pub light_position: [f32; 3],
    /// Padding for 16-byte alignment.
    pub _pad0: f32,
    /// Ambient light color.
    pub ambient_light: [f32; 3],
    /// Padding for 16-byte alignment.
    pub _pad1: f32,
}

impl FrameUniforms {
    /// Build the per-frame uniforms.
    pub fn new(projection: Mat4, light_position: Vec3, ambient_light: Vec3) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            light_position: light_position.to_array(),
            _pad0: 0.0,
            ambient_light: ambient_light.to_array(),
            _pad1: 0.0,
        }
    }
}

/// Per-body GPU uniforms: transforms and the lighting flag.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniforms {
    /// Model-view matrix (view × model, column-major).
    pub model_view: [[f32; 4]; 4],
    /// Normal matrix: transpose of the inverse model-view.
    pub normal_matrix: [[f32; 4]; 4],
    /// 1 to apply the lighting model, 0 to emit raw texture color.
    pub use_lighting: u32,
    /// Padding for 16-byte alignment.
    pub _padding: [u32; 3],
}

impl BodyUniforms {
    /// Build the per-body uniforms, deriving the normal matrix from the
    /// model-view matrix.
    pub fn new(model_view: Mat4, use_lighting: bool) -> Self {
        let normal_matrix = model_view.inverse().transpose();
        Self {
            model_view: model_view.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            use_lighting: u32::from(use_lighting),
            _padding: [0; 3],
        }
    }
}

/// Errors that can occur while building the sphere pipeline.
///
/// Both variants are fatal at startup; the diagnostic from the validation
/// scope rides in `message`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The WGSL source failed shader module validation.
    #[error("sphere shader failed to compile: {message}")]
    ShaderCompile { message: String },

    /// Bind group layout, pipeline layout, or render pipeline creation
    /// failed validation.
    #[error("sphere pipeline creation failed: {message}")]
    Creation { message: String },
}

/// Compile a WGSL shader module, surfacing validation failures as errors.
fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, PipelineError> {
    let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(error) = pollster::block_on(error_scope.pop()) {
        return Err(PipelineError::ShaderCompile {
            message: error.to_string(),
        });
    }
    Ok(shader)
}

/// Render pipeline for textured, lit spheres.
pub struct SpherePipeline {
    /// The wgpu render pipeline.
    pub pipeline: wgpu::RenderPipeline,
    /// Frame uniform bind group layout (group 0).
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    /// Body uniform bind group layout (group 2).
    pub body_bind_group_layout: wgpu::BindGroupLayout,
}

impl SpherePipeline {
    /// Create the sphere render pipeline.
    ///
    /// `texture_bind_group_layout` is the layout for group 1 (texture +
    /// sampler), owned by the texture manager so its cached bind groups
    /// bind directly.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, PipelineError> {
        let shader = compile_shader(device, "sphere-shader", SPHERE_SHADER_SOURCE)?;

        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sphere-frame-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<FrameUniforms>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let body_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sphere-body-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<BodyUniforms>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere-pipeline-layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                texture_bind_group_layout,
                &body_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_sphere"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // sphere quads wind clockwise viewed from outside
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: DepthBuffer::COMPARE_FUNCTION, // reverse-Z
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_sphere"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None, // opaque
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(error_scope.pop()) {
            return Err(PipelineError::Creation {
                message: error.to_string(),
            });
        }

        log::info!("Sphere pipeline created for surface format {surface_format:?}");

        Ok(Self {
            pipeline,
            frame_bind_group_layout,
            body_bind_group_layout,
        })
    }
}

/// Draw one textured sphere.
pub fn draw_sphere<'a>(
    render_pass: &mut wgpu::RenderPass<'a>,
    pipeline: &SpherePipeline,
    frame_bind_group: &'a wgpu::BindGroup,
    texture_bind_group: &'a wgpu::BindGroup,
    body_bind_group: &'a wgpu::BindGroup,
    mesh: &'a MeshBuffer,
) {
    render_pass.set_pipeline(&pipeline.pipeline);
    render_pass.set_bind_group(0, frame_bind_group, &[]);
    render_pass.set_bind_group(1, texture_bind_group, &[]);
    render_pass.set_bind_group(2, body_bind_group, &[]);
    mesh.bind(render_pass);
    mesh.draw(render_pass);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{TextureManager, create_test_device_queue};

    #[test]
    fn test_frame_uniforms_size_alignment() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn test_body_uniforms_size_alignment() {
        assert_eq!(std::mem::size_of::<BodyUniforms>(), 144);
        assert_eq!(std::mem::size_of::<BodyUniforms>() % 16, 0);
    }

    #[test]
    fn test_frame_uniforms_field_offsets() {
        assert_eq!(std::mem::offset_of!(FrameUniforms, projection), 0);
        assert_eq!(std::mem::offset_of!(FrameUniforms, light_position), 64);
        assert_eq!(std::mem::offset_of!(FrameUniforms, ambient_light), 80);
    }

    #[test]
    fn test_body_uniforms_field_offsets() {
        assert_eq!(std::mem::offset_of!(BodyUniforms, model_view), 0);
        assert_eq!(std::mem::offset_of!(BodyUniforms, normal_matrix), 64);
        assert_eq!(std::mem::offset_of!(BodyUniforms, use_lighting), 128);
    }

    #[test]
    fn test_lighting_flag_encoding() {
        assert_eq!(BodyUniforms::new(Mat4::IDENTITY, true).use_lighting, 1);
        assert_eq!(BodyUniforms::new(Mat4::IDENTITY, false).use_lighting, 0);
    }

    #[test]
    fn test_normal_matrix_of_rotation_is_rotation() {
        let rotation = Mat4::from_rotation_y(0.7);
        let uniforms = BodyUniforms::new(rotation, true);

        // transpose(inverse(R)) == R for a pure rotation
        let expected = rotation.to_cols_array_2d();
        for (col_idx, col) in uniforms.normal_matrix.iter().enumerate() {
            for (row_idx, value) in col.iter().enumerate() {
                assert!((value - expected[col_idx][row_idx]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let model_view = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniforms = BodyUniforms::new(model_view, true);

        assert!((uniforms.normal_matrix[0][0] - 0.5).abs() < 1e-6);
        assert!((uniforms.normal_matrix[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pipeline_builds_on_device() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let manager = TextureManager::new(&device);

        let result = SpherePipeline::new(
            &device,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            manager.bind_group_layout(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_shader_reports_compile_error() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };

        let result = compile_shader(&device, "broken", "this is not wgsl");
        assert!(matches!(result, Err(PipelineError::ShaderCompile { .. })));
    }
}
