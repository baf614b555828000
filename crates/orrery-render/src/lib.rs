//! wgpu rendering plumbing: surface management, mesh and uniform buffers,
//! depth, textures, background texture loading, and the sphere pipeline.

pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod loader;
pub mod pass;
pub mod sphere_pipeline;
pub mod texture;

pub use buffer::{
    BufferAllocator, IndexData, MeshBuffer, VertexPositionNormalUv, interleave_sphere,
};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use loader::{
    DecodedImage, TextureLoadError, TextureLoadPipeline, TextureLoadResult, TextureLoadTask,
};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use sphere_pipeline::{
    BodyUniforms, FrameUniforms, PipelineError, SPHERE_SHADER_SOURCE, SpherePipeline, draw_sphere,
};
pub use texture::{ManagedTexture, PLACEHOLDER_TEXEL, TextureError, TextureManager};
