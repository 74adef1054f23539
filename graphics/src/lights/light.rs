//! Light sources.
//!
//! One [`Light`] type covers the fixed variant set (directional, point,
//! quad, mesh-backed area) and dispatches by pattern match. Every externally
//! observable mutation bumps the light's [`VersionId`], which is what
//! [`LightEnvironment`](super::LightEnvironment) watches to rebuild its GPU
//! data lazily.

use std::sync::{Arc, Weak};

use lantern_core::math::{self, Vec3, Vec4};
use lantern_core::mesh::MeshInstance;
use lantern_core::version::VersionId;

use crate::lights::area::AreaSampling;
use crate::lights::data::{LightData, LightType};
use crate::materials::Material;

#[derive(Debug)]
enum LightKind {
    Directional {
        /// Scene center the light is anchored to.
        center: Vec3,
        /// Distance from the center used for position placement and power
        /// estimation.
        distance: f32,
    },
    Point,
    Quad {
        width: f32,
        height: f32,
    },
    Area {
        /// Non-owning reference to the source geometry; the light goes dark
        /// if the instance is dropped.
        instance: Weak<MeshInstance>,
        /// Derived sampling data, absent until prepared or after unload.
        sampling: Option<AreaSampling>,
    },
}

/// A single light source.
#[derive(Debug)]
pub struct Light {
    name: String,
    data: LightData,
    version: VersionId,
    ui_color: Vec3,
    ui_intensity_scale: f32,
    kind: LightKind,
}

impl Light {
    fn new(name: impl Into<String>, data: LightData, kind: LightKind) -> Self {
        Self {
            name: name.into(),
            data,
            version: VersionId::INITIAL,
            ui_color: Vec3::new(1.0, 1.0, 1.0),
            ui_intensity_scale: 1.0,
            kind,
        }
    }

    /// Infinitely distant light shining along `(0, -1, 0)`.
    pub fn directional(name: impl Into<String>) -> Self {
        let data = LightData {
            light_type: LightType::Directional as u32,
            ..LightData::default()
        };
        Self::new(
            name,
            data,
            LightKind::Directional {
                center: Vec3::zeros(),
                distance: 1000.0,
            },
        )
    }

    /// Omnidirectional point light at the origin.
    pub fn point(name: impl Into<String>) -> Self {
        Self::new(name, LightData::default(), LightKind::Point)
    }

    /// Analytic quad emitter centered at the origin, facing `+Z`.
    pub fn quad(name: impl Into<String>, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let data = LightData {
            light_type: LightType::Area as u32,
            world_dir: [0.0, 0.0, 1.0],
            surface_area: width * height,
            tangent: [1.0, 0.0, 0.0],
            bitangent: [0.0, 1.0, 0.0],
            quad_points: [
                [-hw, -hh, 0.0, 0.0],
                [hw, -hh, 0.0, 0.0],
                [hw, hh, 0.0, 0.0],
                [-hw, hh, 0.0, 0.0],
            ],
            ..LightData::default()
        };
        Self::new(name, data, LightKind::Quad { width, height })
    }

    /// Mesh-backed area light.
    ///
    /// Holds a non-owning reference to the instance; the emissive layer of
    /// `material` (if any) seeds the intensity. Sampling data is derived on
    /// the first [`prepare_gpu_data`](Self::prepare_gpu_data).
    pub fn area(
        name: impl Into<String>,
        instance: &Arc<MeshInstance>,
        material: Option<&Material>,
    ) -> Self {
        let mut data = LightData {
            light_type: LightType::Area as u32,
            ..LightData::default()
        };
        if let Some(color) = material.and_then(Material::emissive_color) {
            data.intensity = [color.x, color.y, color.z];
        }
        let mut light = Self::new(
            name,
            data,
            LightKind::Area {
                instance: Arc::downgrade(instance),
                sampling: None,
            },
        );
        light.decompose_intensity();
        light
    }

    /// Light name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// GPU-side light type.
    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Directional { .. } => LightType::Directional,
            LightKind::Point => LightType::Point,
            LightKind::Quad { .. } | LightKind::Area { .. } => LightType::Area,
        }
    }

    /// Whether this light samples mesh geometry.
    pub fn is_area(&self) -> bool {
        matches!(self.kind, LightKind::Area { .. })
    }

    /// Version counter; strictly increases with every mutation.
    pub fn version(&self) -> VersionId {
        self.version
    }

    /// Packed GPU data as of the last [`prepare_gpu_data`](Self::prepare_gpu_data).
    pub fn data(&self) -> &LightData {
        &self.data
    }

    /// Derived area sampling data, if present.
    pub fn sampling(&self) -> Option<&AreaSampling> {
        match &self.kind {
            LightKind::Area { sampling, .. } => sampling.as_ref(),
            _ => None,
        }
    }

    // ---- mutators; each bumps the version ----

    /// Set the radiant intensity.
    pub fn set_intensity(&mut self, intensity: Vec3) {
        self.data.intensity = [intensity.x, intensity.y, intensity.z];
        self.decompose_intensity();
        self.version.bump();
    }

    /// Set the world position.
    pub fn set_world_position(&mut self, position: Vec3) {
        self.data.world_pos = [position.x, position.y, position.z];
        self.version.bump();
    }

    /// Set the world direction (normalized before storing).
    ///
    /// A directional light follows along: its position stays anchored at
    /// `center - direction * distance`.
    pub fn set_world_direction(&mut self, direction: Vec3) {
        let dir = direction.normalize();
        self.data.world_dir = [dir.x, dir.y, dir.z];
        self.update_directional_position();
        self.version.bump();
    }

    /// Set the cone opening angle, clamped to `[0, pi]`.
    pub fn set_opening_angle(&mut self, angle: f32) {
        let angle = angle.clamp(0.0, std::f32::consts::PI);
        self.data.opening_angle = angle;
        self.data.cos_opening_angle = angle.cos();
        self.version.bump();
    }

    /// Set the cone penumbra angle.
    pub fn set_penumbra_angle(&mut self, angle: f32) {
        self.data.penumbra_angle = angle.max(0.0);
        self.version.bump();
    }

    /// Anchor a directional light to the scene: `center` is the scene
    /// center, `radius` its bounding radius. No-op for other kinds.
    ///
    /// The light's position is kept at `center - worldDir * radius`, which
    /// also drives the power estimate.
    pub fn set_world_params(&mut self, center: Vec3, radius: f32) {
        if let LightKind::Directional {
            center: c,
            distance,
        } = &mut self.kind
        {
            *c = center;
            *distance = radius;
            self.update_directional_position();
            self.version.bump();
        }
    }

    fn update_directional_position(&mut self) {
        if let LightKind::Directional { center, distance } = &self.kind {
            let dir = Vec3::from(self.data.world_dir);
            let pos = center - dir * *distance;
            self.data.world_pos = [pos.x, pos.y, pos.z];
        }
    }

    /// Reposition the light at `position`, aimed at `target`.
    ///
    /// Directional lights have no position and reject the move. Area lights
    /// move their source geometry; the packed data follows on the next
    /// [`prepare_gpu_data`](Self::prepare_gpu_data).
    pub fn move_to(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        match &mut self.kind {
            LightKind::Directional { .. } => {
                log::error!("light '{}': cannot move a directional light", self.name);
            }
            LightKind::Point => {
                self.data.world_pos = [position.x, position.y, position.z];
                let dir = (target - position).normalize();
                self.data.world_dir = [dir.x, dir.y, dir.z];
                self.version.bump();
            }
            LightKind::Quad { .. } => {
                self.data.world_pos = [position.x, position.y, position.z];
                self.data.trans_mat =
                    math::mat4_to_cols_array_2d(&math::face_towards(&position, &target, &up));
                self.version.bump();
            }
            LightKind::Area { instance, .. } => match instance.upgrade() {
                Some(instance) => {
                    instance.move_towards(&position, &target, &up);
                    self.version.bump();
                }
                None => {
                    log::warn!("light '{}': source geometry is gone, cannot move", self.name);
                }
            },
        }
    }

    // ---- UI model: intensity = color * scale ----

    /// Normalized intensity color shown in tools.
    pub fn ui_color(&self) -> Vec3 {
        self.ui_color
    }

    /// Intensity magnitude shown in tools.
    pub fn ui_intensity_scale(&self) -> f32 {
        self.ui_intensity_scale
    }

    /// Set the color component, keeping the current scale.
    pub fn set_ui_color(&mut self, color: Vec3) {
        self.ui_color = color;
        let intensity = color * self.ui_intensity_scale;
        self.data.intensity = [intensity.x, intensity.y, intensity.z];
        self.version.bump();
    }

    /// Set the scale component, keeping the current color.
    pub fn set_ui_intensity_scale(&mut self, scale: f32) {
        self.ui_intensity_scale = scale;
        let intensity = self.ui_color * scale;
        self.data.intensity = [intensity.x, intensity.y, intensity.z];
        self.version.bump();
    }

    fn decompose_intensity(&mut self) {
        let intensity = Vec3::from(self.data.intensity);
        let scale = math::max_channel(intensity);
        if scale > 0.0 {
            self.ui_color = intensity / scale;
            self.ui_intensity_scale = scale;
        } else {
            self.ui_color = Vec3::new(1.0, 1.0, 1.0);
            self.ui_intensity_scale = 0.0;
        }
    }

    // ---- derived GPU state ----

    /// Total emitted power, by light kind.
    pub fn power(&self) -> f32 {
        let lum = math::luminance(Vec3::from(self.data.intensity));
        match self.kind {
            LightKind::Directional { distance, .. } => {
                lum * std::f32::consts::PI * distance * distance
            }
            LightKind::Point => lum * 4.0 * std::f32::consts::PI,
            LightKind::Quad { width, height } => lum * width * height,
            LightKind::Area { .. } => lum * std::f32::consts::PI * self.data.surface_area,
        }
    }

    /// Refresh the packed GPU data from current state.
    ///
    /// For area lights this derives sampling data on first use and follows
    /// the source geometry's transform. Unsupported geometry or a dropped
    /// instance leaves the previous data in place with a warning.
    pub fn prepare_gpu_data(&mut self) {
        let LightKind::Area { instance, sampling } = &mut self.kind else {
            return;
        };
        let Some(instance) = instance.upgrade() else {
            log::warn!("light '{}': source geometry is gone", self.name);
            return;
        };

        if sampling.is_none() {
            match AreaSampling::compute(instance.mesh()) {
                Ok(computed) => *sampling = Some(computed),
                Err(err) => {
                    log::warn!("light '{}': {err}", self.name);
                    return;
                }
            }
        }
        let Some(sampling) = sampling.as_ref() else {
            return;
        };

        let transform = instance.transform();
        self.data.trans_mat = math::mat4_to_cols_array_2d(&transform);
        self.data.surface_area = sampling.surface_area;
        self.data.num_indices = (instance.mesh().primitive_count() * 3) as u32;
        self.data.tangent = [sampling.tangent.x, sampling.tangent.y, sampling.tangent.z];
        self.data.bitangent = [
            sampling.bitangent.x,
            sampling.bitangent.y,
            sampling.bitangent.z,
        ];

        let center = sampling.center();
        let world_center = transform * Vec4::new(center.x, center.y, center.z, 1.0);
        self.data.world_pos = [world_center.x, world_center.y, world_center.z];

        let world_dir = transform * Vec4::new(sampling.normal.x, sampling.normal.y, sampling.normal.z, 0.0);
        let world_dir = Vec3::new(world_dir.x, world_dir.y, world_dir.z).normalize();
        self.data.world_dir = [world_dir.x, world_dir.y, world_dir.z];

        // World-space bounds over the transformed local box corners.
        let mut aabb_min = Vec3::from_element(f32::MAX);
        let mut aabb_max = Vec3::from_element(f32::MIN);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { sampling.aabb_min.x } else { sampling.aabb_max.x },
                if i & 2 == 0 { sampling.aabb_min.y } else { sampling.aabb_max.y },
                if i & 4 == 0 { sampling.aabb_min.z } else { sampling.aabb_max.z },
            );
            let world = transform * Vec4::new(corner.x, corner.y, corner.z, 1.0);
            let world = Vec3::new(world.x, world.y, world.z);
            aabb_min = aabb_min.inf(&world);
            aabb_max = aabb_max.sup(&world);
        }
        self.data.aabb_min = [aabb_min.x, aabb_min.y, aabb_min.z];
        self.data.aabb_max = [aabb_max.x, aabb_max.y, aabb_max.z];
    }

    /// Drop derived GPU-facing data; the next prepare rebuilds it.
    pub fn unload_gpu_data(&mut self) {
        if let LightKind::Area { sampling, .. } = &mut self.kind {
            *sampling = None;
        }
    }
}
