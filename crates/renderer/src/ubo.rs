//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the GLSL uniform block layouts exactly.
//! All structures use `#[repr(C)]` for predictable memory layout and implement
//! `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame transform data for the quad.
///
/// This structure matches the GLSL `TransformData` uniform block at binding 0
/// of `quad.vert`.
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: projection matrix (64 bytes)
/// - Total size: 192 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct TransformUBO {
    /// Model matrix (object to world space).
    pub model: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Projection matrix (view to clip space).
    pub projection: Mat4,
}

impl TransformUBO {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a transform UBO from explicit matrices.
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            view,
            projection,
        }
    }

    /// Builds the transform for the spinning quad at `elapsed_secs`.
    ///
    /// The quad rotates about the Z axis at 90 degrees per second, viewed
    /// from (2, 2, 2) toward the origin with Z up. The projection's Y axis
    /// is negated because Vulkan clip space points Y down while glam's
    /// perspective matrices follow the GL convention.
    pub fn spinning(elapsed_secs: f32, aspect_ratio: f32) -> Self {
        let model = Mat4::from_rotation_z(elapsed_secs * 90.0_f32.to_radians());
        let view = Mat4::look_at_rh(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO, Vec3::Z);
        let mut projection =
            Mat4::perspective_rh(45.0_f32.to_radians(), aspect_ratio, 0.1, 10.0);
        projection.y_axis.y *= -1.0;

        Self {
            model,
            view,
            projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_ubo_size() {
        // 3 Mat4 (3 * 64) = 192 bytes
        assert_eq!(TransformUBO::SIZE, 192);
    }

    #[test]
    fn test_transform_ubo_alignment() {
        // Verify proper alignment for GPU (Mat4 requires 16-byte alignment)
        assert_eq!(std::mem::align_of::<TransformUBO>(), 16);
    }

    #[test]
    fn test_spinning_starts_unrotated() {
        let ubo = TransformUBO::spinning(0.0, 16.0 / 9.0);
        assert_eq!(ubo.model, Mat4::IDENTITY);
    }

    #[test]
    fn test_spinning_rotates_quarter_turn_per_second() {
        let ubo = TransformUBO::spinning(1.0, 1.0);
        // After one second the X axis has rotated onto the Y axis.
        let rotated = ubo.model.transform_point3(Vec3::X);
        assert!(rotated.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_spinning_flips_projection_y() {
        let ubo = TransformUBO::spinning(0.0, 16.0 / 9.0);
        assert!(ubo.projection.y_axis.y < 0.0);
    }

    #[test]
    fn test_spinning_view_looks_at_origin() {
        let ubo = TransformUBO::spinning(0.0, 1.0);
        // The camera sits at (2, 2, 2); in view space that point is the origin.
        let eye_in_view = ubo.view.transform_point3(Vec3::new(2.0, 2.0, 2.0));
        assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn test_transform_ubo_pod_zeroable() {
        // Verify Pod and Zeroable traits work
        let ubo = TransformUBO::default();
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), TransformUBO::SIZE);
    }
}
