/// Backend-neutral graphics API: the dispatch trait and the types it speaks

mod backend;
mod preset;
mod state;
mod surface;
mod texture;
mod vertex;

#[cfg(test)]
pub(crate) mod mock_backend;

pub use backend::{Capabilities, GraphicsBackend, MAX_TEXTURE_STAGES};
pub use preset::{AlphaTest, AlphaTestFunc, PresetProgramDesc, TexturePreset};
pub use state::{BlendEquation, BlendFactor, Bounds, ClearFlags, DepthFunc, PrimitiveType, Rect};
pub use surface::{PixelFormat, Surface};
pub use texture::{
    DrawMode, IndexBufferId, RenderbufferId, TextureId, TextureInfo, TextureReleaseCallback,
    VertexBufferId,
};
pub use vertex::{
    vertex_bytes, ColorVertex, ComponentType, TexturedVertex, VertexDefinition, VertexElement,
    VertexElementKind,
};
