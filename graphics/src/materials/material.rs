//! The material aggregate.
//!
//! A [`Material`] owns one layer stack, the four global maps, and a cache of
//! everything derived from them: the packed GPU blob, the interned
//! descriptor id, the texture count, and display strings. Mutators only mark
//! the cache stale; [`Material::finalize`] rebuilds it at most once per
//! change.

use std::sync::Arc;

use lantern_core::derived::Derived;
use lantern_core::math::{Vec3, Vec4};
use lantern_core::sampler::CpuSampler;
use lantern_core::texture::CpuTexture;

use crate::block::ParameterBlockData;
use crate::error::GraphicsError;
use crate::materials::data::{
    MaterialData, MaterialDescFlags, PackedMaterialDesc, MATERIAL_DATA_SIZE,
    MATERIAL_TEXTURE_COUNT, MAX_LAYERS,
};
use crate::materials::layer::{Layer, LayerBlend, LayerStack, LayerType, Ndf};
use crate::materials::system::{DescriptorId, MaterialSystem};

/// Everything recomputed by [`Material::finalize`].
#[derive(Debug, Default)]
struct MaterialDerived {
    data: MaterialData,
    texture_count: u32,
    desc_string: String,
    type_name: String,
    block: ParameterBlockData,
}

/// A layered shading material.
///
/// Construction assigns a process-unique id from the shared
/// [`MaterialSystem`]; the id is never reused, even after the material is
/// dropped.
#[derive(Debug)]
pub struct Material {
    name: String,
    system: Arc<MaterialSystem>,
    id: u32,
    layers: LayerStack,
    alpha_map: Option<Arc<CpuTexture>>,
    normal_map: Option<Arc<CpuTexture>>,
    height_map: Option<Arc<CpuTexture>>,
    ambient_map: Option<Arc<CpuTexture>>,
    sampler: Arc<CpuSampler>,
    alpha_threshold: f32,
    height_scale: f32,
    height_offset: f32,
    double_sided: bool,
    descriptor: Option<(DescriptorId, PackedMaterialDesc)>,
    derived: Derived<MaterialDerived>,
}

impl Material {
    /// Create an empty material registered with `system`.
    pub fn new(name: impl Into<String>, system: Arc<MaterialSystem>) -> Self {
        let id = system.allocate_material_id();
        Self {
            name: name.into(),
            system,
            id,
            layers: LayerStack::new(),
            alpha_map: None,
            normal_map: None,
            height_map: None,
            ambient_map: None,
            sampler: Arc::new(CpuSampler::linear()),
            alpha_threshold: 0.5,
            height_scale: 1.0,
            height_offset: 0.0,
            double_sided: false,
            descriptor: None,
            derived: Derived::default(),
        }
    }

    /// Material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique material id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The layer stack.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Whether derived data must be rebuilt before use.
    pub fn is_dirty(&self) -> bool {
        self.derived.is_stale()
    }

    // ---- mutators; each invalidates the derived cache ----

    /// Append a layer. Fails without mutating if the stack is full.
    pub fn add_layer(&mut self, layer: Layer) -> Result<usize, GraphicsError> {
        let index = self.layers.add_layer(layer)?;
        self.derived.invalidate();
        Ok(index)
    }

    /// Remove the layer at `index`, compacting the stack.
    pub fn remove_layer(&mut self, index: usize) {
        self.layers.remove_layer(index);
        self.derived.invalidate();
    }

    /// Set a layer's albedo.
    pub fn set_layer_albedo(&mut self, index: usize, albedo: Vec4) {
        if let Some(layer) = self.layers.layer_mut(index) {
            layer.albedo = albedo;
            self.derived.invalidate();
        }
    }

    /// Set a layer's roughness.
    pub fn set_layer_roughness(&mut self, index: usize, roughness: f32) {
        if let Some(layer) = self.layers.layer_mut(index) {
            layer.roughness = roughness;
            self.derived.invalidate();
        }
    }

    /// Set a layer's blend mode.
    pub fn set_layer_blend(&mut self, index: usize, blend: LayerBlend) {
        if let Some(layer) = self.layers.layer_mut(index) {
            layer.blend = blend;
            self.derived.invalidate();
        }
    }

    /// Set a layer's NDF.
    pub fn set_layer_ndf(&mut self, index: usize, ndf: Ndf) {
        if let Some(layer) = self.layers.layer_mut(index) {
            layer.ndf = ndf;
            self.derived.invalidate();
        }
    }

    /// Set or clear a layer's albedo texture.
    pub fn set_layer_texture(&mut self, index: usize, texture: Option<Arc<CpuTexture>>) {
        if let Some(layer) = self.layers.layer_mut(index) {
            layer.texture = texture;
            self.derived.invalidate();
        }
    }

    /// Set or clear the alpha (cutout) map.
    pub fn set_alpha_map(&mut self, texture: Option<Arc<CpuTexture>>) {
        self.alpha_map = texture;
        self.derived.invalidate();
    }

    /// Set or clear the normal map.
    pub fn set_normal_map(&mut self, texture: Option<Arc<CpuTexture>>) {
        self.normal_map = texture;
        self.derived.invalidate();
    }

    /// Set or clear the height map.
    pub fn set_height_map(&mut self, texture: Option<Arc<CpuTexture>>) {
        self.height_map = texture;
        self.derived.invalidate();
    }

    /// Set or clear the ambient occlusion map.
    pub fn set_ambient_map(&mut self, texture: Option<Arc<CpuTexture>>) {
        self.ambient_map = texture;
        self.derived.invalidate();
    }

    /// Set the shared sampler.
    pub fn set_sampler(&mut self, sampler: Arc<CpuSampler>) {
        self.sampler = sampler;
        self.derived.invalidate();
    }

    /// Set the alpha-test threshold.
    pub fn set_alpha_threshold(&mut self, threshold: f32) {
        self.alpha_threshold = threshold;
        self.derived.invalidate();
    }

    /// Set the height map scale and bias.
    pub fn set_height_modifiers(&mut self, scale: f32, offset: f32) {
        self.height_scale = scale;
        self.height_offset = offset;
        self.derived.invalidate();
    }

    /// Set whether the material shades both faces.
    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
        self.derived.invalidate();
    }

    // ---- derived state ----

    /// Rebuild all derived state if anything changed since the last call.
    ///
    /// Idempotent: a second call without intervening mutation does nothing.
    /// On failure the material stays dirty so the next call retries.
    pub fn finalize(&mut self) -> Result<(), GraphicsError> {
        if self.derived.is_fresh() {
            return Ok(());
        }

        let mut desc = PackedMaterialDesc::default();
        self.layers.write_desc(&mut desc);
        desc.flags = self.desc_flags().bits();

        // Release-then-intern only when the shape actually changed; an
        // unchanged descriptor keeps its reference count untouched.
        let changed = match &self.descriptor {
            Some((_, previous)) => bytemuck::bytes_of(previous) != bytemuck::bytes_of(&desc),
            None => true,
        };
        if changed {
            if let Some((previous_id, _)) = self.descriptor.take() {
                self.system.release(previous_id);
            }
            let id = self.system.intern(&desc);
            self.descriptor = Some((id, desc));
        }

        for diagnostic in self.layers.normalize() {
            log::warn!("material '{}': {}", self.name, diagnostic);
        }

        let mut data = MaterialData { desc, ..MaterialData::default() };
        data.values.layers = self.layers.packed_values();
        data.values.alpha_threshold = self.alpha_threshold;
        data.values.height_scale = self.height_scale;
        data.values.height_offset = self.height_offset;
        data.values.id = self.id;

        let texture_count = self.count_textures();
        let desc_string = self.build_desc_string();
        let type_name = self.build_type_name();

        self.derived.try_refresh_with(|d| {
            d.data = data;
            d.texture_count = texture_count;
            d.desc_string = desc_string;
            d.type_name = type_name;
            d.block.resize(MATERIAL_DATA_SIZE);
            d.block.set_pod(0, &data)
        })?;
        Ok(())
    }

    /// Interned descriptor id, once finalized.
    pub fn descriptor_id(&self) -> Option<DescriptorId> {
        self.descriptor.as_ref().map(|(id, _)| *id)
    }

    /// Packed GPU data, once finalized.
    pub fn data(&self) -> Option<&MaterialData> {
        self.derived.get().map(|d| &d.data)
    }

    /// Staged parameter block, once finalized.
    pub fn parameter_block(&self) -> Option<&ParameterBlockData> {
        self.derived.get().map(|d| &d.block)
    }

    /// Number of bound textures, once finalized.
    pub fn texture_count(&self) -> Option<u32> {
        self.derived.get().map(|d| d.texture_count)
    }

    /// Human-readable descriptor summary, once finalized.
    pub fn desc_string(&self) -> Option<&str> {
        self.derived.get().map(|d| d.desc_string.as_str())
    }

    /// Shader type name for this material shape, once finalized.
    pub fn type_name(&self) -> Option<&str> {
        self.derived.get().map(|d| d.type_name.as_str())
    }

    /// Texture bindings in slot order: layer slots first, then the alpha,
    /// normal, height, and ambient maps.
    pub fn texture_bindings(&self) -> Vec<(u32, Option<Arc<CpuTexture>>)> {
        let mut bindings = Vec::with_capacity(MATERIAL_TEXTURE_COUNT);
        for slot in 0..MAX_LAYERS {
            let texture = self.layers.layer(slot).and_then(|l| l.texture.clone());
            bindings.push((slot as u32, texture));
        }
        let base = MAX_LAYERS as u32;
        bindings.push((base, self.alpha_map.clone()));
        bindings.push((base + 1, self.normal_map.clone()));
        bindings.push((base + 2, self.height_map.clone()));
        bindings.push((base + 3, self.ambient_map.clone()));
        bindings
    }

    /// The shared sampler.
    pub fn sampler(&self) -> &Arc<CpuSampler> {
        &self.sampler
    }

    /// Whether any layer emits light.
    pub fn has_emissive(&self) -> bool {
        self.layers.layer_id_by_type(LayerType::Emissive).is_some()
    }

    /// Albedo RGB of the first emissive layer, if any.
    pub fn emissive_color(&self) -> Option<Vec3> {
        let index = self.layers.layer_id_by_type(LayerType::Emissive)?;
        let albedo = self.layers.layer(index)?.albedo;
        Some(Vec3::new(albedo.x, albedo.y, albedo.z))
    }

    fn desc_flags(&self) -> MaterialDescFlags {
        let mut flags = MaterialDescFlags::empty();
        flags.set(MaterialDescFlags::ALPHA_MAP, self.alpha_map.is_some());
        flags.set(MaterialDescFlags::NORMAL_MAP, self.normal_map.is_some());
        flags.set(MaterialDescFlags::HEIGHT_MAP, self.height_map.is_some());
        flags.set(MaterialDescFlags::AMBIENT_MAP, self.ambient_map.is_some());
        flags.set(MaterialDescFlags::DOUBLE_SIDED, self.double_sided);
        flags
    }

    fn count_textures(&self) -> u32 {
        self.texture_bindings()
            .iter()
            .filter(|(_, t)| t.is_some())
            .count() as u32
    }

    fn build_type_name(&self) -> String {
        let count = |t: LayerType| self.layers.iter().filter(|l| l.layer_type == t).count();
        format!(
            "StandardMaterial<{},{},{},{}>",
            count(LayerType::Lambert),
            count(LayerType::Conductor),
            count(LayerType::Dielectric),
            count(LayerType::Emissive),
        )
    }

    fn build_desc_string(&self) -> String {
        let mut out = String::new();
        for layer in self.layers.iter() {
            out.push_str(&format!(
                "[{:?} {:?} {:?}{}]",
                layer.layer_type,
                layer.ndf,
                layer.blend,
                if layer.texture.is_some() { " tex" } else { "" },
            ));
        }
        let flags = self.desc_flags();
        if !flags.is_empty() {
            out.push_str(&format!(" {flags:?}"));
        }
        out
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        if let Some((id, _)) = self.descriptor.take() {
            self.system.release(id);
        }
    }
}

impl PartialEq for Material {
    /// Structural and value equality, ignoring name and unique id.
    ///
    /// Texture handles compare by identity; pixel contents never matter
    /// here. Samplers are value data and compare by state.
    fn eq(&self, other: &Self) -> bool {
        let shape = |m: &Self| {
            let mut desc = PackedMaterialDesc::default();
            m.layers.write_desc(&mut desc);
            desc.flags = m.desc_flags().bits();
            desc
        };
        if shape(self) != shape(other) {
            return false;
        }
        if self.layers.packed_values() != other.layers.packed_values() {
            return false;
        }
        if self.alpha_threshold != other.alpha_threshold
            || self.height_scale != other.height_scale
            || self.height_offset != other.height_offset
        {
            return false;
        }
        let same_handle = |a: &Option<Arc<CpuTexture>>, b: &Option<Arc<CpuTexture>>| match (a, b) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.texture_bindings()
            .iter()
            .zip(other.texture_bindings().iter())
            .all(|((_, a), (_, b))| same_handle(a, b))
            && *self.sampler == *other.sampler
    }
}
