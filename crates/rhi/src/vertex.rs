//! Vertex data structures and input descriptions.
//!
//! This module defines the vertex format consumed by the quad pipeline.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Vertex format for the textured quad.
///
/// Each vertex contains:
/// - `position` (Vec2): 2D position in object space; the model matrix lifts it into 3D
/// - `color` (Vec3): RGB color multiplied with the sampled texel
/// - `tex_coord` (Vec2): texture coordinates (UV)
///
/// # Memory Layout
///
/// The struct uses `#[repr(C)]` to ensure predictable memory layout:
/// - Offset 0: position (8 bytes)
/// - Offset 8: color (12 bytes)
/// - Offset 20: tex_coord (8 bytes)
/// - Total size: 28 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec2)
/// - location 1: color (vec3)
/// - location 2: tex_coord (vec2)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct QuadVertex {
    /// 2D position in object space.
    pub position: Vec2,
    /// RGB color multiplied with the sampled texel.
    pub color: Vec3,
    /// Texture coordinates (UV).
    pub tex_coord: Vec2,
}

impl QuadVertex {
    /// Creates a new vertex with the specified attributes.
    #[inline]
    pub const fn new(position: Vec2, color: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            color,
            tex_coord,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    ///
    /// Returns a binding description for binding 0 with per-vertex input rate.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            // Color at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 8,
            },
            // TexCoord at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 20,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertex_size() {
        // Vec2 (8) + Vec3 (12) + Vec2 (8) = 28 bytes, no padding
        assert_eq!(std::mem::size_of::<QuadVertex>(), 28);
        assert_eq!(QuadVertex::size(), 28);
    }

    #[test]
    fn quad_vertex_binding_description() {
        let binding = QuadVertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 28);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn quad_vertex_attribute_descriptions() {
        let attrs = QuadVertex::attribute_descriptions();
        assert_eq!(attrs.len(), 3);

        // Position attribute (location 0)
        assert_eq!(attrs[0].binding, 0);
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);

        // Color attribute (location 1)
        assert_eq!(attrs[1].binding, 0);
        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[1].offset, 8);

        // TexCoord attribute (location 2)
        assert_eq!(attrs[2].binding, 0);
        assert_eq!(attrs[2].location, 2);
        assert_eq!(attrs[2].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[2].offset, 20);
    }

    #[test]
    fn quad_vertex_offsets_match_attributes() {
        use std::mem::offset_of;

        assert_eq!(offset_of!(QuadVertex, position), 0);
        assert_eq!(offset_of!(QuadVertex, color), 8);
        assert_eq!(offset_of!(QuadVertex, tex_coord), 20);
    }

    #[test]
    fn quad_vertex_round_trips_through_bytes() {
        let vertex = QuadVertex::new(
            Vec2::new(-0.5, 0.5),
            Vec3::new(1.0, 0.0, 0.0),
            Vec2::new(0.0, 1.0),
        );

        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 28);

        let back: &QuadVertex = bytemuck::from_bytes(bytes);
        assert_eq!(back.position, vertex.position);
        assert_eq!(back.color, vertex.color);
        assert_eq!(back.tex_coord, vertex.tex_coord);
    }
}
