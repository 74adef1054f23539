//! Packed material data matching the shader-side constant buffer layout.
//!
//! Every struct here is `repr(C)` plain-old-data and mirrors a shader struct
//! field for field. Sizes are multiples of 16 bytes (constant buffer packing
//! rules). The descriptor half carries only the material's *shape* and is
//! what the interner compares byte-wise; the values half carries numbers and
//! never participates in interning.

use bytemuck::{Pod, Zeroable};
use core::mem::offset_of;
use static_assertions::const_assert;

use crate::block::{validate_layout, BlockReflection};
use crate::error::GraphicsError;

/// Maximum number of layers in a material stack.
pub const MAX_LAYERS: usize = 3;

/// Number of distinct layer types (including `None`).
pub const NUM_LAYER_TYPES: usize = 6;

/// Slots in the packed `layer_id_by_type` table (layer types padded to a
/// 16-byte multiple).
pub const LAYER_ID_SLOTS: usize = 8;

/// Texture binding slots per material: one per layer plus the four global
/// maps (alpha, normal, height, ambient).
pub const MATERIAL_TEXTURE_COUNT: usize = MAX_LAYERS + 4;

/// Sentinel for "no layer of this type".
pub const LAYER_ID_UNSET: i32 = -1;

bitflags::bitflags! {
    /// Per-layer descriptor bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LayerDescFlags: u32 {
        /// The layer samples its albedo from a texture.
        const TEXTURE = 1;
        /// Roughness is stored in the albedo texture's alpha channel.
        const ROUGHNESS_IN_ALPHA = 2;
    }
}

bitflags::bitflags! {
    /// Material-wide descriptor bits for the global maps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MaterialDescFlags: u32 {
        /// An alpha (cutout) map is bound.
        const ALPHA_MAP = 1;
        /// A normal map is bound.
        const NORMAL_MAP = 2;
        /// A height map is bound.
        const HEIGHT_MAP = 4;
        /// An ambient occlusion map is bound.
        const AMBIENT_MAP = 8;
        /// The material shades both faces.
        const DOUBLE_SIDED = 16;
    }
}

/// Shape of one layer slot: type, NDF, blend mode, texture bits.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct PackedLayerDesc {
    /// Layer type discriminant ([`LayerType`](super::LayerType) as u32).
    pub layer_type: u32,
    /// NDF discriminant ([`Ndf`](super::Ndf) as u32).
    pub ndf: u32,
    /// Blend mode discriminant ([`LayerBlend`](super::LayerBlend) as u32).
    pub blend: u32,
    /// [`LayerDescFlags`] bits.
    pub flags: u32,
}

const_assert!(core::mem::size_of::<PackedLayerDesc>() == 16);

/// Shape of a whole material: per-slot layer descs, the type-to-slot table,
/// global map bits, and the occupied layer count.
///
/// Interned byte-wise; two materials with equal `PackedMaterialDesc` bytes
/// share one descriptor id.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PackedMaterialDesc {
    /// One desc per layer slot; unoccupied slots are all-zero.
    pub layers: [PackedLayerDesc; MAX_LAYERS],
    /// First slot index per layer type, [`LAYER_ID_UNSET`] when absent.
    pub layer_id_by_type: [i32; LAYER_ID_SLOTS],
    /// [`MaterialDescFlags`] bits.
    pub flags: u32,
    /// Number of occupied layer slots.
    pub layer_count: u32,
    pub _pad: [u32; 2],
}

impl Default for PackedMaterialDesc {
    fn default() -> Self {
        Self {
            layers: [PackedLayerDesc::default(); MAX_LAYERS],
            layer_id_by_type: [LAYER_ID_UNSET; LAYER_ID_SLOTS],
            flags: 0,
            layer_count: 0,
            _pad: [0; 2],
        }
    }
}

const_assert!(core::mem::size_of::<PackedMaterialDesc>() == 96);

/// Numeric values of one layer slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PackedLayerValues {
    /// Albedo RGB plus blend weight in alpha.
    pub albedo: [f32; 4],
    /// Microfacet roughness.
    pub roughness: f32,
    /// Layer-type specific parameter (e.g. index of refraction).
    pub extra_param: f32,
    /// Sampling probability derived by normalization.
    pub pmf: f32,
    pub _pad: f32,
}

const_assert!(core::mem::size_of::<PackedLayerValues>() == 32);

/// Numeric values of a whole material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PackedMaterialValues {
    /// One value block per layer slot.
    pub layers: [PackedLayerValues; MAX_LAYERS],
    /// Alpha-test threshold.
    pub alpha_threshold: f32,
    /// Height map scale.
    pub height_scale: f32,
    /// Height map bias.
    pub height_offset: f32,
    /// Process-unique material id.
    pub id: u32,
}

const_assert!(core::mem::size_of::<PackedMaterialValues>() == 112);

/// The full per-material constant buffer blob: descriptor then values.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MaterialData {
    /// Structural half, shared via interning.
    pub desc: PackedMaterialDesc,
    /// Numeric half, unique per material.
    pub values: PackedMaterialValues,
}

/// Size of [`MaterialData`] in bytes.
pub const MATERIAL_DATA_SIZE: usize = core::mem::size_of::<MaterialData>();

const_assert!(MATERIAL_DATA_SIZE == 208);
const_assert!(MATERIAL_DATA_SIZE % 16 == 0);

/// Check the CPU-side [`MaterialData`] layout against a shader reflection.
///
/// Callers run this once at startup in debug builds; a mismatch means the
/// shader struct and this module drifted apart.
pub fn validate_material_layout(reflection: &impl BlockReflection) -> Result<(), GraphicsError> {
    if reflection.byte_size() != MATERIAL_DATA_SIZE {
        return Err(GraphicsError::LayoutMismatch {
            member: "gMaterial",
            expected: reflection.byte_size(),
            actual: MATERIAL_DATA_SIZE,
        });
    }
    validate_layout(
        reflection,
        &[
            ("desc.layers", offset_of!(MaterialData, desc.layers)),
            (
                "desc.layerIdByType",
                offset_of!(MaterialData, desc.layer_id_by_type),
            ),
            ("desc.flags", offset_of!(MaterialData, desc.flags)),
            ("desc.layerCount", offset_of!(MaterialData, desc.layer_count)),
            ("values.layers", offset_of!(MaterialData, values.layers)),
            (
                "values.alphaThreshold",
                offset_of!(MaterialData, values.alpha_threshold),
            ),
            ("values.id", offset_of!(MaterialData, values.id)),
        ],
    )
}
