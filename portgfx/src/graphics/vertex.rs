/// Vertex layout description and stock vertex types
///
/// A `VertexDefinition` describes one interleaved vertex record. It is owned by
/// the caller and only borrowed by backends for the duration of a call.

use bytemuck::{Pod, Zeroable};

/// Semantic role of a vertex element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementKind {
    Position,
    TexCoord0,
    TexCoord1,
    TexCoord2,
    TexCoord3,
    Color,
}

impl VertexElementKind {
    /// Texture-coordinate slot (0..=3) for texcoord elements
    pub fn texcoord_slot(self) -> Option<usize> {
        match self {
            VertexElementKind::TexCoord0 => Some(0),
            VertexElementKind::TexCoord1 => Some(1),
            VertexElementKind::TexCoord2 => Some(2),
            VertexElementKind::TexCoord3 => Some(3),
            _ => None,
        }
    }
}

/// Component type of a vertex element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float,
    UnsignedByte,
}

impl ComponentType {
    pub fn byte_size(self) -> usize {
        match self {
            ComponentType::Float => 4,
            ComponentType::UnsignedByte => 1,
        }
    }
}

/// One element of an interleaved vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub kind: VertexElementKind,
    /// Component count (1..=4)
    pub components: u8,
    pub component_type: ComponentType,
    /// Byte offset inside the vertex record
    pub offset: usize,
}

impl VertexElement {
    /// Byte size of this element
    pub fn byte_size(&self) -> usize {
        self.components as usize * self.component_type.byte_size()
    }
}

/// Ordered element list plus the per-vertex byte stride
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexDefinition {
    pub elements: Vec<VertexElement>,
    pub stride: usize,
}

impl VertexDefinition {
    pub fn new(stride: usize) -> Self {
        Self { elements: Vec::new(), stride }
    }

    /// Append an element (builder style)
    pub fn with(
        mut self,
        kind: VertexElementKind,
        components: u8,
        component_type: ComponentType,
        offset: usize,
    ) -> Self {
        self.elements.push(VertexElement { kind, components, component_type, offset });
        self
    }

    /// True when every element fits inside the stride
    pub fn is_consistent(&self) -> bool {
        self.stride > 0
            && self.elements.iter().all(|e| {
                (1..=4).contains(&e.components) && e.offset + e.byte_size() <= self.stride
            })
    }

    /// Byte length needed to hold `count` vertices
    pub fn byte_len(&self, count: usize) -> usize {
        self.stride * count
    }
}

// ===== STOCK VERTEX TYPES =====

/// Untextured 2D/3D vertex: position + RGBA8 color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

impl ColorVertex {
    pub fn definition() -> VertexDefinition {
        VertexDefinition::new(std::mem::size_of::<Self>())
            .with(VertexElementKind::Position, 3, ComponentType::Float, 0)
            .with(VertexElementKind::Color, 4, ComponentType::UnsignedByte, 12)
    }
}

/// Textured vertex: position + RGBA8 color + one texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub uv: [f32; 2],
}

impl TexturedVertex {
    pub fn definition() -> VertexDefinition {
        VertexDefinition::new(std::mem::size_of::<Self>())
            .with(VertexElementKind::Position, 3, ComponentType::Float, 0)
            .with(VertexElementKind::Color, 4, ComponentType::UnsignedByte, 12)
            .with(VertexElementKind::TexCoord0, 2, ComponentType::Float, 16)
    }
}

/// Reinterpret a vertex slice as the raw bytes the draw calls take
pub fn vertex_bytes<V: Pod>(vertices: &[V]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
