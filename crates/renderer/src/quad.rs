//! Static geometry for the textured quad.
//!
//! The quad is a unit square centered on the origin in the XY plane. The
//! model matrix spins it; corner colors are distinct so the interpolation
//! and winding are easy to eyeball.

use glam::{Vec2, Vec3};

use spinel_rhi::vertex::QuadVertex;

/// The four corners of the quad, with per-corner color and texture
/// coordinates.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new(
        Vec2::new(-0.5, -0.5),
        Vec3::new(1.0, 0.0, 0.0),
        Vec2::new(1.0, 0.0),
    ),
    QuadVertex::new(
        Vec2::new(0.5, -0.5),
        Vec3::new(0.0, 1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ),
    QuadVertex::new(
        Vec2::new(0.5, 0.5),
        Vec3::new(0.0, 0.0, 1.0),
        Vec2::new(0.0, 1.0),
    ),
    QuadVertex::new(
        Vec2::new(-0.5, 0.5),
        Vec3::new(1.0, 1.0, 1.0),
        Vec2::new(1.0, 1.0),
    ),
];

/// Two triangles covering the quad, sharing the diagonal between corners
/// 0 and 2.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_has_four_corners_and_six_indices() {
        assert_eq!(QUAD_VERTICES.len(), 4);
        assert_eq!(QUAD_INDICES.len(), 6);
    }

    #[test]
    fn quad_indices_stay_in_bounds() {
        for &index in &QUAD_INDICES {
            assert!((index as usize) < QUAD_VERTICES.len());
        }
    }

    #[test]
    fn quad_is_centered_on_origin() {
        let centroid: Vec2 = QUAD_VERTICES
            .iter()
            .map(|v| v.position)
            .sum::<Vec2>()
            / QUAD_VERTICES.len() as f32;
        assert!(centroid.abs_diff_eq(Vec2::ZERO, 1e-6));
    }

    #[test]
    fn quad_triangles_share_the_diagonal() {
        // Both triangles reference corners 0 and 2.
        let first = &QUAD_INDICES[0..3];
        let second = &QUAD_INDICES[3..6];
        for corner in [0u16, 2u16] {
            assert!(first.contains(&corner));
            assert!(second.contains(&corner));
        }
    }
}
