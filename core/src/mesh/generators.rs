//! Procedural generators for simple test geometry.

use crate::math::Vec3;
use crate::mesh::CpuMesh;

/// Axis-aligned quad in the XY plane, centered at the origin.
///
/// Two triangles, four vertices, facing +Z. Corner order matches the
/// convention area-light sampling relies on: the first triangle is
/// (bottom-left, bottom-right, top-right).
pub fn quad(width: f32, height: f32) -> CpuMesh {
    let hw = width * 0.5;
    let hh = height * 0.5;
    CpuMesh::new(
        vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .with_name("quad")
}
