//! Packed per-light data matching the shader-side constant buffer layout.

use bytemuck::{Pod, Zeroable};
use core::mem::offset_of;
use static_assertions::const_assert;

use crate::block::{validate_layout, BlockReflection};
use crate::error::GraphicsError;

/// Maximum number of lights a light environment uploads.
pub const MAX_LIGHT_SOURCES: usize = 16;

/// GPU-side light type discriminant.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    /// Infinitely distant light with a direction only.
    Directional = 0,
    /// Omnidirectional (optionally cone-limited) emitter at a point.
    #[default]
    Point = 1,
    /// Light emitted from surface geometry.
    Area = 2,
}

/// Per-light constant buffer blob.
///
/// Field order and padding mirror the shader struct; see
/// [`validate_light_layout`]. Area-light CDF tables are uploaded as a
/// separate buffer and are not part of this blob.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    /// World-space position (area lights: bounding-box center).
    pub world_pos: [f32; 3],
    /// [`LightType`] discriminant.
    pub light_type: u32,
    /// World-space direction (area lights: surface normal).
    pub world_dir: [f32; 3],
    /// Cone opening angle in radians.
    pub opening_angle: f32,
    /// Radiant intensity (radiance for surface emitters).
    pub intensity: [f32; 3],
    /// Cosine of the opening angle, precomputed for shading.
    pub cos_opening_angle: f32,
    /// Bounding box minimum (area lights).
    pub aabb_min: [f32; 3],
    /// Total surface area (area and quad lights).
    pub surface_area: f32,
    /// Bounding box maximum (area lights).
    pub aabb_max: [f32; 3],
    /// Number of triangle indices in the source geometry.
    pub num_indices: u32,
    /// Surface tangent frame, first axis.
    pub tangent: [f32; 3],
    /// Cone penumbra angle in radians.
    pub penumbra_angle: f32,
    /// Surface tangent frame, second axis.
    pub bitangent: [f32; 3],
    pub _pad0: f32,
    /// Object-to-world transform of the source geometry, column-major.
    pub trans_mat: [[f32; 4]; 4],
    /// Quad light corner positions, one per row, w unused.
    pub quad_points: [[f32; 4]; 4],
    pub _pad1: [f32; 4],
}

/// Size of [`LightData`] in bytes.
pub const LIGHT_DATA_SIZE: usize = core::mem::size_of::<LightData>();

const_assert!(LIGHT_DATA_SIZE == 256);
const_assert!(LIGHT_DATA_SIZE % 16 == 0);

impl Default for LightData {
    fn default() -> Self {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            world_pos: [0.0; 3],
            light_type: LightType::Point as u32,
            world_dir: [0.0, -1.0, 0.0],
            opening_angle: std::f32::consts::PI,
            intensity: [1.0; 3],
            cos_opening_angle: -1.0,
            aabb_min: [f32::MAX; 3],
            surface_area: 0.0,
            aabb_max: [f32::MIN; 3],
            num_indices: 0,
            tangent: [0.0; 3],
            penumbra_angle: 0.0,
            bitangent: [0.0; 3],
            _pad0: 0.0,
            trans_mat: identity,
            quad_points: [[0.0; 4]; 4],
            _pad1: [0.0; 4],
        }
    }
}

/// Check the CPU-side [`LightData`] layout against a shader reflection.
pub fn validate_light_layout(reflection: &impl BlockReflection) -> Result<(), GraphicsError> {
    if reflection.byte_size() != LIGHT_DATA_SIZE {
        return Err(GraphicsError::LayoutMismatch {
            member: "gLight",
            expected: reflection.byte_size(),
            actual: LIGHT_DATA_SIZE,
        });
    }
    validate_layout(
        reflection,
        &[
            ("worldPos", offset_of!(LightData, world_pos)),
            ("type", offset_of!(LightData, light_type)),
            ("worldDir", offset_of!(LightData, world_dir)),
            ("intensity", offset_of!(LightData, intensity)),
            ("aabbMin", offset_of!(LightData, aabb_min)),
            ("aabbMax", offset_of!(LightData, aabb_max)),
            ("numIndices", offset_of!(LightData, num_indices)),
            ("transMat", offset_of!(LightData, trans_mat)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::StaticReflection;

    /// Member table as the reference shader declares it.
    const SHADER_LIGHT: StaticReflection = StaticReflection::new(
        &[
            ("worldPos", 0),
            ("type", 12),
            ("worldDir", 16),
            ("intensity", 32),
            ("aabbMin", 48),
            ("aabbMax", 64),
            ("numIndices", 76),
            ("transMat", 112),
        ],
        LIGHT_DATA_SIZE,
    );

    #[test]
    fn layout_matches_shader() {
        validate_light_layout(&SHADER_LIGHT).unwrap();
    }

    #[test]
    fn default_is_a_white_point_light() {
        let data = LightData::default();
        assert_eq!(data.light_type, LightType::Point as u32);
        assert_eq!(data.intensity, [1.0; 3]);
        assert_eq!(data.world_dir, [0.0, -1.0, 0.0]);
        // Full sphere: cos(pi) == -1.
        assert_eq!(data.cos_opening_angle, -1.0);
        assert_eq!(data.trans_mat[0][0], 1.0);
    }
}
