//! Mesh geometry and instancing.

use std::sync::{Arc, Mutex};

use crate::math::{self, Mat4, Vec3};

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form an independent triangle.
    #[default]
    TriangleList,
    /// Indices form a connected strip of triangles.
    TriangleStrip,
    /// Every two indices form an independent line.
    LineList,
}

/// Immutable CPU-side mesh geometry.
///
/// Geometry never changes after construction; anything that needs to move a
/// mesh does so through a [`MeshInstance`] transform.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    /// Mesh name.
    pub name: Option<String>,
    /// How indices are assembled into primitives.
    pub topology: PrimitiveTopology,
    /// Vertex positions in object space.
    pub positions: Vec<Vec3>,
    /// Triangle indices into `positions`.
    pub indices: Vec<[u32; 3]>,
}

impl CpuMesh {
    /// Create a triangle-list mesh from positions and triangle indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<[u32; 3]>) -> Self {
        Self {
            name: None,
            topology: PrimitiveTopology::TriangleList,
            positions,
            indices,
        }
    }

    /// Set the mesh name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of primitives.
    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.iter().copied()
    }

    /// Positions of the three corners of triangle `i`.
    pub fn triangle_positions(&self, i: usize) -> [Vec3; 3] {
        let [a, b, c] = self.indices[i];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }
}

/// A placed instance of a shared mesh.
///
/// The transform is behind a mutex so an instance can be repositioned through
/// a shared reference; the geometry itself stays immutable.
#[derive(Debug)]
pub struct MeshInstance {
    mesh: Arc<CpuMesh>,
    transform: Mutex<Mat4>,
}

impl MeshInstance {
    /// Place a mesh with the given world transform.
    pub fn new(mesh: Arc<CpuMesh>, transform: Mat4) -> Self {
        Self {
            mesh,
            transform: Mutex::new(transform),
        }
    }

    /// The shared geometry.
    pub fn mesh(&self) -> &Arc<CpuMesh> {
        &self.mesh
    }

    /// Current world transform.
    pub fn transform(&self) -> Mat4 {
        *self.transform.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the world transform.
    pub fn set_transform(&self, transform: Mat4) {
        *self.transform.lock().unwrap_or_else(|e| e.into_inner()) = transform;
    }

    /// Reposition the instance at `position`, oriented towards `target`.
    pub fn move_towards(&self, position: &Vec3, target: &Vec3, up: &Vec3) {
        self.set_transform(math::face_towards(position, target, up));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> CpuMesh {
        CpuMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn counts() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.primitive_count(), 1);
    }

    #[test]
    fn triangle_positions_follow_indices() {
        let mesh = triangle();
        let [a, b, c] = mesh.triangle_positions(0);
        assert_eq!(a, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(b, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(c, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn instance_transform_is_shared_mutable() {
        let instance = MeshInstance::new(Arc::new(triangle()), Mat4::identity());
        let t = math::mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        instance.set_transform(t);
        assert_eq!(instance.transform(), t);
    }

    #[test]
    fn move_towards_places_at_position() {
        let instance = MeshInstance::new(Arc::new(triangle()), Mat4::identity());
        let position = Vec3::new(0.0, 5.0, 0.0);
        instance.move_towards(&position, &Vec3::zeros(), &Vec3::new(0.0, 0.0, 1.0));
        let m = instance.transform();
        assert!((m[(1, 3)] - 5.0).abs() < 1e-6);
    }
}
