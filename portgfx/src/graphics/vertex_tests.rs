//! Unit tests for vertex.rs

use crate::graphics::vertex::*;

// ============================================================================
// ELEMENT KIND TESTS
// ============================================================================

#[test]
fn test_texcoord_slots() {
    assert_eq!(VertexElementKind::TexCoord0.texcoord_slot(), Some(0));
    assert_eq!(VertexElementKind::TexCoord3.texcoord_slot(), Some(3));
    assert_eq!(VertexElementKind::Position.texcoord_slot(), None);
    assert_eq!(VertexElementKind::Color.texcoord_slot(), None);
}

// ============================================================================
// DEFINITION TESTS
// ============================================================================

#[test]
fn test_definition_builder_keeps_order() {
    let def = VertexDefinition::new(20)
        .with(VertexElementKind::Position, 2, ComponentType::Float, 0)
        .with(VertexElementKind::TexCoord0, 2, ComponentType::Float, 8)
        .with(VertexElementKind::Color, 4, ComponentType::UnsignedByte, 16);

    let kinds: Vec<_> = def.elements.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![VertexElementKind::Position, VertexElementKind::TexCoord0, VertexElementKind::Color]
    );
    assert!(def.is_consistent());
    assert_eq!(def.byte_len(3), 60);
}

#[test]
fn test_definition_inconsistent_when_element_overflows_stride() {
    let def = VertexDefinition::new(12)
        .with(VertexElementKind::Position, 3, ComponentType::Float, 4);
    assert!(!def.is_consistent());

    let zero_stride = VertexDefinition::new(0);
    assert!(!zero_stride.is_consistent());
}

// ============================================================================
// STOCK VERTEX TESTS
// ============================================================================

#[test]
fn test_color_vertex_layout() {
    let def = ColorVertex::definition();
    assert_eq!(def.stride, 16);
    assert!(def.is_consistent());
}

#[test]
fn test_textured_vertex_layout() {
    let def = TexturedVertex::definition();
    assert_eq!(def.stride, 24);
    assert!(def.is_consistent());
    assert_eq!(def.elements[2].offset, 16);
}

#[test]
fn test_vertex_bytes_length() {
    let verts = [
        ColorVertex { position: [0.0, 0.0, 0.0], color: [255, 0, 0, 255] },
        ColorVertex { position: [1.0, 0.0, 0.0], color: [0, 255, 0, 255] },
    ];
    let bytes = vertex_bytes(&verts);
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[12..16], &[255, 0, 0, 255]);
}
