/// Resource keys and texture descriptors shared by every backend

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked key for a texture.
    ///
    /// A released texture's key never aliases a later texture stored in the
    /// same slot; using it fails with `Error::InvalidHandle`.
    pub struct TextureId;

    /// Key for a depth-stencil renderbuffer
    pub struct RenderbufferId;

    /// Key for a vertex buffer
    pub struct VertexBufferId;

    /// Key for a 16-bit index buffer
    pub struct IndexBufferId;
}

/// Logical size and UV scale of a texture
///
/// `width_mult`/`height_mult` convert pixel coordinates to the texture's
/// native addressing: `1 / physical size` for normalized targets, `1` for
/// rectangle targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub width_mult: f32,
    pub height_mult: f32,
}

/// Sampling filter used when a texture is bound to a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    Nearest,
    Bilinear,
}

/// Callback run right before a texture's native object is destroyed
pub type TextureReleaseCallback = Box<dyn FnMut(TextureId) + Send>;
