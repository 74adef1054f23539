//! Math type aliases and helper functions.
//!
//! All rendering math is f32 and backed by `nalgebra`, which is re-exported
//! for callers that need types beyond the aliases below.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Photometric luminance of a linear RGB color (Rec. 709 weights).
pub fn luminance(color: Vec3) -> f32 {
    0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z
}

/// Largest channel of a linear RGB color.
///
/// Used as a conservative reflectance bound where a per-channel worst case
/// is wanted rather than a perceptual average.
pub fn max_channel(color: Vec3) -> f32 {
    color.x.max(color.y).max(color.z)
}

/// Linear interpolation between `a` and `b` by `t`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Build a model transform that places an object at `eye`, facing `target`.
pub fn face_towards(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::face_towards(&eye_point, &target_point, up).to_homogeneous()
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Convert a 4x4 matrix to a column-major `[[f32; 4]; 4]` array.
pub fn mat4_to_cols_array_2d(m: &Mat4) -> [[f32; 4]; 4] {
    let s = m.as_slice();
    [
        [s[0], s[1], s[2], s[3]],
        [s[4], s[5], s[6], s[7]],
        [s[8], s[9], s[10], s[11]],
        [s[12], s[13], s[14], s[15]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_of_primaries() {
        assert!((luminance(Vec3::new(1.0, 0.0, 0.0)) - 0.2126).abs() < 1e-6);
        assert!((luminance(Vec3::new(0.0, 1.0, 0.0)) - 0.7152).abs() < 1e-6);
        assert!((luminance(Vec3::new(1.0, 1.0, 1.0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn max_channel_picks_largest() {
        assert_eq!(max_channel(Vec3::new(0.9, 0.0, 0.0)), 0.9);
        assert_eq!(max_channel(Vec3::new(0.1, 0.5, 0.3)), 0.5);
    }

    #[test]
    fn mix_endpoints() {
        assert_eq!(mix(1.0, 3.0, 0.0), 1.0);
        assert_eq!(mix(1.0, 3.0, 1.0), 3.0);
        assert_eq!(mix(1.0, 3.0, 0.5), 2.0);
    }

    #[test]
    fn translation_matrix() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn face_towards_places_at_eye() {
        let eye = Vec3::new(5.0, 0.0, 0.0);
        let m = face_towards(&eye, &Vec3::zeros(), &Vec3::new(0.0, 1.0, 0.0));
        assert!((m[(0, 3)] - 5.0).abs() < 1e-6);
        assert!((m[(1, 3)]).abs() < 1e-6);
        assert!((m[(2, 3)]).abs() < 1e-6);
    }

    #[test]
    fn cols_array_2d_identity() {
        let cols = mat4_to_cols_array_2d(&Mat4::identity());
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(cols[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
