//! Area-light sampling data derived from mesh geometry.

use std::sync::{Arc, Mutex};

use lantern_core::math::Vec3;
use lantern_core::mesh::{CpuMesh, MeshInstance, PrimitiveTopology};

use crate::error::GraphicsError;
use crate::lights::light::Light;
use crate::materials::Material;

/// Sampling data for a mesh-backed area light: total surface area, a
/// per-triangle CDF for area-proportional point sampling, a tangent frame,
/// and the geometry bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSampling {
    /// Total surface area of the geometry.
    pub surface_area: f32,
    /// Cumulative distribution over triangles; length is triangle count + 1,
    /// starts at 0 and ends at exactly 1.
    pub cdf: Vec<f32>,
    /// Tangent of the surface frame, from the first triangle's edges.
    pub tangent: Vec3,
    /// Bitangent of the surface frame.
    pub bitangent: Vec3,
    /// Surface normal of the first triangle.
    pub normal: Vec3,
    /// Bounding box minimum over all vertices.
    pub aabb_min: Vec3,
    /// Bounding box maximum over all vertices.
    pub aabb_max: Vec3,
}

impl AreaSampling {
    /// Derive sampling data from mesh geometry.
    ///
    /// Only a two-triangle quad (four vertices) is supported; the tangent
    /// frame and normal come from the first triangle, which is valid only
    /// for planar, consistently wound geometry. Anything else is rejected
    /// and the caller keeps whatever sampling data it had.
    pub fn compute(mesh: &CpuMesh) -> Result<Self, GraphicsError> {
        if mesh.topology != PrimitiveTopology::TriangleList
            || mesh.primitive_count() != 2
            || mesh.vertex_count() != 4
        {
            return Err(GraphicsError::UnsupportedTopology(format!(
                "area light requires a 2-triangle quad, got {} triangles over {} vertices",
                mesh.primitive_count(),
                mesh.vertex_count(),
            )));
        }
        let vertex_count = mesh.vertex_count() as u32;
        if mesh.triangles().any(|t| t.iter().any(|&i| i >= vertex_count)) {
            return Err(GraphicsError::UnsupportedTopology(
                "area light indices reference vertices beyond the mesh".to_string(),
            ));
        }

        let mut cdf = Vec::with_capacity(mesh.primitive_count() + 1);
        cdf.push(0.0f32);
        for i in 0..mesh.primitive_count() {
            let [p0, p1, p2] = mesh.triangle_positions(i);
            let area = (p1 - p0).cross(&(p2 - p0)).norm() * 0.5;
            cdf.push(cdf[i] + area);
        }

        let surface_area = *cdf.last().unwrap_or(&0.0);
        if surface_area > 0.0 {
            for value in cdf.iter_mut().skip(1) {
                *value /= surface_area;
            }
            // Pin the boundary so inverse-CDF sampling never walks off the
            // end due to floating-point drift.
            if let Some(last) = cdf.last_mut() {
                *last = 1.0;
            }
        }

        let [p0, p1, p2] = mesh.triangle_positions(0);
        let tangent = p0 - p1;
        let bitangent = p2 - p1;
        let normal = (p1 - p0).cross(&(p2 - p0)).normalize();

        let mut aabb_min = Vec3::from_element(f32::MAX);
        let mut aabb_max = Vec3::from_element(f32::MIN);
        for p in &mesh.positions {
            aabb_min = aabb_min.inf(p);
            aabb_max = aabb_max.sup(p);
        }

        Ok(Self {
            surface_area,
            cdf,
            tangent,
            bitangent,
            normal,
            aabb_min,
            aabb_max,
        })
    }

    /// Bounding-box center, used as the light's world position.
    pub fn center(&self) -> Vec3 {
        (self.aabb_min + self.aabb_max) * 0.5
    }
}

/// Create one area light per mesh instance whose material emits light.
///
/// Instances with a non-emissive material are skipped. The emissive layer's
/// albedo seeds the light intensity.
pub fn create_area_lights(
    instances: &[(Arc<MeshInstance>, Option<&Material>)],
) -> Vec<Arc<Mutex<Light>>> {
    let mut lights = Vec::new();
    for (i, (instance, material)) in instances.iter().enumerate() {
        let emissive = material.map_or(false, Material::has_emissive);
        if !emissive {
            continue;
        }
        let name = instance
            .mesh()
            .name
            .clone()
            .unwrap_or_else(|| format!("area_light_{i}"));
        lights.push(Arc::new(Mutex::new(Light::area(
            name,
            instance,
            *material,
        ))));
    }
    log::info!("created {} area lights", lights.len());
    lights
}
