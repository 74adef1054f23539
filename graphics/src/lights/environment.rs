//! The aggregate light environment.

use std::sync::{Arc, Mutex};

use lantern_core::sampler::CpuSampler;
use lantern_core::texture::CpuTexture;
use lantern_core::version::VersionId;

use crate::block::ParameterBlockData;
use crate::error::GraphicsError;
use crate::lights::data::{LIGHT_DATA_SIZE, MAX_LIGHT_SOURCES};
use crate::lights::light::Light;

/// Ordered collection of lights with one aggregate version counter.
///
/// Per light, the environment remembers the last version it observed; the
/// aggregate version bumps exactly once per scan that sees at least one
/// changed light, no matter how many changed. The packed GPU blob is rebuilt
/// only when the aggregate version moved past the one cached at the last
/// rebuild.
#[derive(Debug)]
pub struct LightEnvironment {
    name: String,
    lights: Vec<Arc<Mutex<Light>>>,
    observed: Vec<Option<VersionId>>,
    version: VersionId,
    built_version: Option<VersionId>,
    block: ParameterBlockData,
    sampler: Arc<CpuSampler>,
    ltc_matrix_texture: Option<Arc<CpuTexture>>,
    ltc_magnitude_texture: Option<Arc<CpuTexture>>,
}

impl LightEnvironment {
    /// Empty environment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lights: Vec::new(),
            observed: Vec::new(),
            version: VersionId::INITIAL,
            built_version: None,
            block: ParameterBlockData::new(),
            sampler: Arc::new(CpuSampler::linear()),
            ltc_matrix_texture: None,
            ltc_magnitude_texture: None,
        }
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Shared handle to the light at `index`.
    pub fn light(&self, index: usize) -> Option<&Arc<Mutex<Light>>> {
        self.lights.get(index)
    }

    /// Iterate over all light handles.
    pub fn lights(&self) -> impl Iterator<Item = &Arc<Mutex<Light>>> {
        self.lights.iter()
    }

    /// Sampler shared by all light textures.
    pub fn sampler(&self) -> &Arc<CpuSampler> {
        &self.sampler
    }

    /// LTC lookup textures (matrix, magnitude) for area-light shading.
    pub fn ltc_textures(&self) -> (Option<&Arc<CpuTexture>>, Option<&Arc<CpuTexture>>) {
        (
            self.ltc_matrix_texture.as_ref(),
            self.ltc_magnitude_texture.as_ref(),
        )
    }

    /// Set the LTC lookup textures used by area-light shading.
    pub fn set_ltc_textures(
        &mut self,
        matrix: Option<Arc<CpuTexture>>,
        magnitude: Option<Arc<CpuTexture>>,
    ) {
        self.ltc_matrix_texture = matrix;
        self.ltc_magnitude_texture = magnitude;
    }

    /// Add a light. Fails without mutating once the upload limit is reached.
    pub fn add_light(&mut self, light: Arc<Mutex<Light>>) -> Result<(), GraphicsError> {
        if self.lights.len() >= MAX_LIGHT_SOURCES {
            return Err(GraphicsError::CapacityExceeded {
                what: "light sources",
                capacity: MAX_LIGHT_SOURCES,
            });
        }
        self.lights.push(light);
        self.observed.push(None);
        self.version.bump();
        Ok(())
    }

    /// Remove the light at `index`, keeping the observed-version array in
    /// lock-step.
    pub fn delete_light(&mut self, index: usize) {
        if index >= self.lights.len() {
            debug_assert!(false, "delete_light index {index} out of range");
            log::error!(
                "delete_light: index {} out of range ({} lights)",
                index,
                self.lights.len()
            );
            return;
        }
        self.lights.remove(index);
        self.observed.remove(index);
        self.version.bump();
    }

    /// Remove all mesh-backed area lights.
    pub fn delete_area_lights(&mut self) {
        let mut removed = 0;
        let mut i = 0;
        while i < self.lights.len() {
            let is_area = self.lights[i]
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_area();
            if is_area {
                self.lights.remove(i);
                self.observed.remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }
        if removed > 0 {
            log::info!("environment '{}': removed {removed} area lights", self.name);
            self.version.bump();
        }
    }

    /// Append every light of `other` to this environment.
    pub fn merge(&mut self, other: &LightEnvironment) -> Result<(), GraphicsError> {
        for light in &other.lights {
            self.add_light(light.clone())?;
        }
        Ok(())
    }

    /// Scan all lights and return the aggregate version.
    ///
    /// Bumps the counter at most once per call, regardless of how many
    /// lights changed since the last scan.
    pub fn aggregate_version(&mut self) -> VersionId {
        let mut changed = false;
        for (light, observed) in self.lights.iter().zip(&mut self.observed) {
            let current = light.lock().unwrap_or_else(|e| e.into_inner()).version();
            if observed.map_or(true, |last| current > last) {
                *observed = Some(current);
                changed = true;
            }
        }
        if changed {
            self.version.bump();
        }
        self.version
    }

    /// Packed GPU blob for all lights, rebuilt only when something changed.
    ///
    /// Layout: light count as `u32`, 12 bytes of padding, then one
    /// [`LIGHT_DATA_SIZE`] record per light.
    pub fn parameter_block(&mut self) -> Result<&ParameterBlockData, GraphicsError> {
        let version = self.aggregate_version();
        if self.built_version == Some(version) {
            return Ok(&self.block);
        }

        log::debug!(
            "environment '{}': rebuilding parameter block for {} lights",
            self.name,
            self.lights.len()
        );
        self.block
            .resize(16 + MAX_LIGHT_SOURCES * LIGHT_DATA_SIZE);
        self.block.set_pod(0, &(self.lights.len() as u32))?;
        for (i, light) in self.lights.iter().enumerate() {
            let mut light = light.lock().unwrap_or_else(|e| e.into_inner());
            light.prepare_gpu_data();
            self.block.set_pod(16 + i * LIGHT_DATA_SIZE, light.data())?;
        }

        self.built_version = Some(version);
        Ok(&self.block)
    }
}
