//! Material layers and the layer stack.
//!
//! A [`LayerStack`] is a fixed-capacity ordered list of shading layers.
//! Order is evaluation order; removals compact the stack so occupied slots
//! always form a contiguous prefix. The stack owns energy-conservation
//! normalization and the per-layer sampling PMF derivation.

use std::sync::Arc;

use lantern_core::math::{self, Vec3, Vec4};
use lantern_core::texture::CpuTexture;

use crate::error::GraphicsError;
use crate::materials::data::{
    LayerDescFlags, PackedLayerDesc, PackedLayerValues, PackedMaterialDesc, LAYER_ID_SLOTS,
    LAYER_ID_UNSET, MAX_LAYERS, NUM_LAYER_TYPES,
};

/// Shading role of a layer.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerType {
    /// Empty slot.
    #[default]
    None = 0,
    /// Diffuse reflection.
    Lambert = 1,
    /// Metallic reflection.
    Conductor = 2,
    /// Refractive layer.
    Dielectric = 3,
    /// Light emission.
    Emissive = 4,
    /// Application-defined shading.
    User = 5,
}

impl LayerType {
    /// Whether layers of this type participate in energy normalization.
    pub fn is_reflective(self) -> bool {
        matches!(self, Self::Lambert | Self::Conductor | Self::Dielectric)
    }
}

/// Microfacet normal distribution function.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ndf {
    /// Beckmann distribution.
    Beckmann = 0,
    /// GGX (Trowbridge-Reitz) distribution.
    #[default]
    Ggx = 1,
    /// Application-defined distribution.
    User = 2,
}

/// How a layer combines with the layers beneath it.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerBlend {
    /// Fresnel-weighted blend.
    #[default]
    Fresnel = 0,
    /// Constant blend with the albedo's alpha as weight.
    Constant = 1,
    /// Additive contribution.
    Add = 2,
}

/// One shading layer within a material stack.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    /// Shading role.
    pub layer_type: LayerType,
    /// Microfacet distribution.
    pub ndf: Ndf,
    /// Combination with layers beneath.
    pub blend: LayerBlend,
    /// Albedo RGB; alpha is the blend weight for [`LayerBlend::Constant`].
    pub albedo: Vec4,
    /// Microfacet roughness.
    pub roughness: f32,
    /// Layer-type specific parameter (e.g. index of refraction).
    pub extra_param: f32,
    /// Optional albedo texture; presence is part of the descriptor.
    pub texture: Option<Arc<CpuTexture>>,
    /// Sampling probability, derived by [`LayerStack::normalize`].
    pub(crate) pmf: f32,
}

impl Layer {
    fn with_type(layer_type: LayerType) -> Self {
        Self {
            layer_type,
            albedo: Vec4::new(1.0, 1.0, 1.0, 1.0),
            roughness: 0.5,
            ..Self::default()
        }
    }

    /// Diffuse layer with white albedo.
    pub fn lambert() -> Self {
        Self::with_type(LayerType::Lambert)
    }

    /// Metallic layer with white albedo.
    pub fn conductor() -> Self {
        Self::with_type(LayerType::Conductor)
    }

    /// Refractive layer with white albedo.
    pub fn dielectric() -> Self {
        Self::with_type(LayerType::Dielectric)
    }

    /// Emissive layer with white albedo.
    pub fn emissive() -> Self {
        Self::with_type(LayerType::Emissive)
    }

    /// Set the albedo.
    #[must_use]
    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.albedo = albedo;
        self
    }

    /// Set the roughness.
    #[must_use]
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Set the blend mode.
    #[must_use]
    pub fn with_blend(mut self, blend: LayerBlend) -> Self {
        self.blend = blend;
        self
    }

    /// Set the NDF.
    #[must_use]
    pub fn with_ndf(mut self, ndf: Ndf) -> Self {
        self.ndf = ndf;
        self
    }

    /// Set the albedo texture.
    #[must_use]
    pub fn with_texture(mut self, texture: Arc<CpuTexture>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Sampling probability derived by the last normalization pass.
    pub fn pmf(&self) -> f32 {
        self.pmf
    }

    /// Albedo RGB channels.
    fn albedo_rgb(&self) -> Vec3 {
        Vec3::new(self.albedo.x, self.albedo.y, self.albedo.z)
    }

    /// Conservative reflectance bound used by normalization.
    fn albedo_bound(&self) -> f32 {
        math::max_channel(self.albedo_rgb())
    }

    /// Descriptor bits for this layer.
    fn desc_flags(&self) -> LayerDescFlags {
        let mut flags = LayerDescFlags::empty();
        if let Some(texture) = &self.texture {
            flags |= LayerDescFlags::TEXTURE;
            // Conductor/dielectric roughness rides in the albedo texture's
            // alpha channel when the format actually stores one.
            let has_alpha = texture.format.channel_count() == 4 && !texture.format.is_bgrx();
            if has_alpha
                && matches!(
                    self.layer_type,
                    LayerType::Conductor | LayerType::Dielectric
                )
            {
                flags |= LayerDescFlags::ROUGHNESS_IN_ALPHA;
            }
        }
        flags
    }

    pub(crate) fn packed_desc(&self) -> PackedLayerDesc {
        PackedLayerDesc {
            layer_type: self.layer_type as u32,
            ndf: self.ndf as u32,
            blend: self.blend as u32,
            flags: self.desc_flags().bits(),
        }
    }

    pub(crate) fn packed_values(&self) -> PackedLayerValues {
        PackedLayerValues {
            albedo: [self.albedo.x, self.albedo.y, self.albedo.z, self.albedo.w],
            roughness: self.roughness,
            extra_param: self.extra_param,
            pmf: self.pmf,
            _pad: 0.0,
        }
    }
}

/// Fixed-capacity ordered stack of shading layers.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    layer_id_by_type: [i32; NUM_LAYER_TYPES],
}

impl LayerStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self {
            layers: Vec::with_capacity(MAX_LAYERS),
            layer_id_by_type: [LAYER_ID_UNSET; NUM_LAYER_TYPES],
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer at `index`, if occupied.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Mutable layer at `index`, if occupied.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Iterate over occupied slots in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Slot index of the first layer with the given type, if any.
    pub fn layer_id_by_type(&self, layer_type: LayerType) -> Option<usize> {
        let id = self.layer_id_by_type[layer_type as usize];
        (id != LAYER_ID_UNSET).then_some(id as usize)
    }

    /// Append a layer at the first free slot.
    ///
    /// Fails without mutating if all slots are occupied. The type-to-slot
    /// table records only the first occurrence of each type.
    pub fn add_layer(&mut self, layer: Layer) -> Result<usize, GraphicsError> {
        if self.layers.len() >= MAX_LAYERS {
            return Err(GraphicsError::CapacityExceeded {
                what: "material layers",
                capacity: MAX_LAYERS,
            });
        }
        let index = self.layers.len();
        let type_slot = &mut self.layer_id_by_type[layer.layer_type as usize];
        if *type_slot == LAYER_ID_UNSET {
            *type_slot = index as i32;
        }
        self.layers.push(layer);
        Ok(index)
    }

    /// Remove the layer at `index`, shifting later layers down.
    ///
    /// An out-of-range index is a caller contract violation.
    pub fn remove_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            debug_assert!(false, "remove_layer index {index} out of range");
            log::error!(
                "remove_layer: index {} out of range (stack has {} layers)",
                index,
                self.layers.len()
            );
            return;
        }
        self.layers.remove(index);
        self.rebuild_layer_id_table();
    }

    /// Rescan all slots. Later slots overwrite earlier claims for the same
    /// type, matching the rebuild order.
    fn rebuild_layer_id_table(&mut self) {
        self.layer_id_by_type = [LAYER_ID_UNSET; NUM_LAYER_TYPES];
        for (i, layer) in self.layers.iter().enumerate() {
            self.layer_id_by_type[layer.layer_type as usize] = i as i32;
        }
    }

    /// Number of layers in the normalization-eligible prefix.
    ///
    /// Normalization scans reflective layers from slot 0 and stops at the
    /// first layer of any other type, even if reflective layers follow it.
    fn eligible_prefix(&self) -> usize {
        self.layers
            .iter()
            .take_while(|l| l.layer_type.is_reflective())
            .count()
    }

    /// Enforce energy conservation and derive per-layer sampling PMFs.
    ///
    /// Accumulates a worst-case total albedo over the eligible prefix,
    /// rescales albedos if the total exceeds 1, then derives each layer's
    /// PMF scanning the prefix in reverse. Returns diagnostics for
    /// conditions that were auto-corrected rather than failed.
    pub fn normalize(&mut self) -> Vec<GraphicsError> {
        let mut diagnostics = Vec::new();
        let eligible = self.eligible_prefix();
        if eligible == 0 {
            return diagnostics;
        }

        let mut total = 0.0f32;
        for layer in &self.layers[..eligible] {
            let bound = layer.albedo_bound();
            match layer.blend {
                LayerBlend::Add | LayerBlend::Fresnel => total += bound,
                LayerBlend::Constant => total = math::mix(total, bound, layer.albedo.w),
            }
        }

        if total <= 0.0 {
            diagnostics.push(GraphicsError::DegenerateEnergy(
                "total albedo is zero, material is pitch black".to_string(),
            ));
            total = 1.0;
        } else if total > 1.0 {
            log::warn!(
                "material energy exceeds 1 (total {total}), rescaling albedos by {}",
                1.0 / total
            );
            let scale = 1.0 / total;
            for layer in &mut self.layers[..eligible] {
                layer.albedo.x *= scale;
                layer.albedo.y *= scale;
                layer.albedo.z *= scale;
            }
            total = 1.0;
        }

        // Layer selection probabilities model top-down stochastic
        // compositing, so the scan runs back to front.
        let mut current_weight = 1.0f32;
        for layer in self.layers[..eligible].iter_mut().rev() {
            let blend_weight = match layer.blend {
                LayerBlend::Constant => layer.albedo.w,
                LayerBlend::Fresnel | LayerBlend::Add => 1.0,
            };
            layer.pmf = layer.albedo_bound() * blend_weight * current_weight / total;
            current_weight = match layer.blend {
                LayerBlend::Constant => (1.0 - current_weight).max(0.0),
                LayerBlend::Fresnel | LayerBlend::Add => 1.0,
            };
        }

        diagnostics
    }

    /// Fill the structural half of the packed material data.
    pub(crate) fn write_desc(&self, desc: &mut PackedMaterialDesc) {
        desc.layers = [PackedLayerDesc::default(); MAX_LAYERS];
        for (slot, layer) in desc.layers.iter_mut().zip(&self.layers) {
            *slot = layer.packed_desc();
        }
        desc.layer_id_by_type = [LAYER_ID_UNSET; LAYER_ID_SLOTS];
        desc.layer_id_by_type[..NUM_LAYER_TYPES].copy_from_slice(&self.layer_id_by_type);
        desc.layer_count = self.layers.len() as u32;
    }

    /// Packed value blocks per slot, in slot order.
    pub(crate) fn packed_values(&self) -> [PackedLayerValues; MAX_LAYERS] {
        let mut values = [PackedLayerValues::default(); MAX_LAYERS];
        for (slot, layer) in values.iter_mut().zip(&self.layers) {
            *slot = layer.packed_values();
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f32 = 1e-5;

    fn red(layer_type: fn() -> Layer, blend: LayerBlend) -> Layer {
        layer_type()
            .with_albedo(Vec4::new(0.9, 0.0, 0.0, 1.0))
            .with_blend(blend)
    }

    #[test]
    fn add_layer_respects_capacity() {
        let mut stack = LayerStack::new();
        for _ in 0..MAX_LAYERS {
            stack.add_layer(Layer::lambert()).unwrap();
        }
        let err = stack.add_layer(Layer::conductor()).unwrap_err();
        assert!(matches!(err, GraphicsError::CapacityExceeded { .. }));
        // Rejected insert leaves the stack unchanged.
        assert_eq!(stack.len(), MAX_LAYERS);
        assert_eq!(stack.layer_id_by_type(LayerType::Conductor), None);
    }

    #[test]
    fn first_occurrence_claims_type_slot() {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::lambert()).unwrap();
        stack.add_layer(Layer::lambert()).unwrap();
        assert_eq!(stack.layer_id_by_type(LayerType::Lambert), Some(0));
    }

    #[test]
    fn remove_compacts_and_rebuilds_type_table() {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::lambert()).unwrap();
        stack.add_layer(Layer::conductor()).unwrap();
        stack.add_layer(Layer::emissive()).unwrap();

        stack.remove_layer(0);

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.layer(0).unwrap().layer_type, LayerType::Conductor);
        assert_eq!(stack.layer(1).unwrap().layer_type, LayerType::Emissive);
        assert_eq!(stack.layer_id_by_type(LayerType::Conductor), Some(0));
        assert_eq!(stack.layer_id_by_type(LayerType::Emissive), Some(1));
        assert_eq!(stack.layer_id_by_type(LayerType::Lambert), None);
    }

    #[test]
    fn normalize_rescales_excess_energy() {
        let mut stack = LayerStack::new();
        stack.add_layer(red(Layer::lambert, LayerBlend::Add)).unwrap();
        stack
            .add_layer(red(Layer::conductor, LayerBlend::Add))
            .unwrap();

        let diagnostics = stack.normalize();
        assert!(diagnostics.is_empty());

        // Total 1.8 > 1, both layers rescaled by 1/1.8.
        assert!((stack.layer(0).unwrap().albedo.x - 0.5).abs() < EPS);
        assert!((stack.layer(1).unwrap().albedo.x - 0.5).abs() < EPS);
        // Alpha preserved.
        assert_eq!(stack.layer(0).unwrap().albedo.w, 1.0);

        let pmf_sum: f32 = stack.iter().map(Layer::pmf).sum();
        assert!((pmf_sum - 1.0).abs() < EPS);
    }

    #[test]
    fn normalize_flags_pitch_black() {
        let mut stack = LayerStack::new();
        stack
            .add_layer(Layer::lambert().with_albedo(Vec4::new(0.0, 0.0, 0.0, 1.0)))
            .unwrap();
        let diagnostics = stack.normalize();
        assert!(matches!(
            diagnostics.as_slice(),
            [GraphicsError::DegenerateEnergy(_)]
        ));
    }

    #[test]
    fn normalize_stops_at_first_non_reflective_layer() {
        let mut stack = LayerStack::new();
        stack
            .add_layer(Layer::lambert().with_albedo(Vec4::new(0.8, 0.8, 0.8, 1.0)))
            .unwrap();
        stack.add_layer(Layer::emissive()).unwrap();
        stack
            .add_layer(
                Layer::conductor()
                    .with_albedo(Vec4::new(0.9, 0.9, 0.9, 1.0))
                    .with_blend(LayerBlend::Add),
            )
            .unwrap();

        stack.normalize();

        // The conductor sits past the emissive layer and is skipped, so no
        // rescaling happens even though 0.8 + 0.9 > 1.
        assert!((stack.layer(0).unwrap().albedo.x - 0.8).abs() < EPS);
        assert!((stack.layer(2).unwrap().albedo.x - 0.9).abs() < EPS);
        assert_eq!(stack.layer(2).unwrap().pmf(), 0.0);
    }

    #[rstest]
    #[case::single_fresnel(vec![(LayerBlend::Fresnel, 0.6, 1.0)])]
    #[case::two_add(vec![(LayerBlend::Add, 0.9, 1.0), (LayerBlend::Add, 0.9, 1.0)])]
    #[case::constant_over_base(vec![(LayerBlend::Fresnel, 0.7, 1.0), (LayerBlend::Constant, 0.8, 0.4)])]
    #[case::two_fresnel(vec![(LayerBlend::Fresnel, 0.4, 1.0), (LayerBlend::Fresnel, 0.5, 1.0)])]
    fn normalized_sums_stay_bounded(#[case] spec: Vec<(LayerBlend, f32, f32)>) {
        let mut stack = LayerStack::new();
        for (blend, value, alpha) in spec {
            stack
                .add_layer(
                    Layer::lambert()
                        .with_albedo(Vec4::new(value, value, value, alpha))
                        .with_blend(blend),
                )
                .unwrap();
        }
        stack.normalize();

        // Re-accumulate the worst-case total with the same blend rules; after
        // normalization it must not exceed 1.
        let mut total = 0.0f32;
        for layer in stack.iter() {
            let bound = math::max_channel(Vec3::new(layer.albedo.x, layer.albedo.y, layer.albedo.z));
            match layer.blend {
                LayerBlend::Add | LayerBlend::Fresnel => total += bound,
                LayerBlend::Constant => total = math::mix(total, bound, layer.albedo.w),
            }
        }
        assert!(total <= 1.0 + EPS);

        let pmf_sum: f32 = stack.iter().map(Layer::pmf).sum();
        assert!(pmf_sum <= 1.0 + EPS);
        assert!(stack.iter().all(|l| l.pmf() >= 0.0));
    }

    #[test]
    fn roughness_in_alpha_requires_real_alpha_channel() {
        use lantern_core::texture::{CpuTexture, TextureFormat};

        let rgba = Arc::new(CpuTexture::new(TextureFormat::Rgba8Unorm, 1, 1));
        let bgrx = Arc::new(CpuTexture::new(TextureFormat::Bgrx8Unorm, 1, 1));

        let with_alpha = Layer::conductor().with_texture(rgba.clone()).packed_desc();
        assert_ne!(with_alpha.flags & LayerDescFlags::ROUGHNESS_IN_ALPHA.bits(), 0);

        let padded = Layer::conductor().with_texture(bgrx).packed_desc();
        assert_eq!(padded.flags & LayerDescFlags::ROUGHNESS_IN_ALPHA.bits(), 0);

        // Diffuse layers never store roughness in alpha.
        let diffuse = Layer::lambert().with_texture(rgba).packed_desc();
        assert_eq!(diffuse.flags & LayerDescFlags::ROUGHNESS_IN_ALPHA.bits(), 0);
        assert_ne!(diffuse.flags & LayerDescFlags::TEXTURE.bits(), 0);
    }
}
