//! Layered materials and the shared material system.
//!
//! A [`Material`] composes up to [`MAX_LAYERS`](data::MAX_LAYERS) shading
//! layers into one energy-conserving stack and produces the packed binary
//! data shader constant buffers consume. Structurally identical materials
//! share one interned descriptor id through the [`MaterialSystem`].

mod data;
mod layer;
mod material;
mod system;

pub use data::{
    validate_material_layout, LayerDescFlags, MaterialData, MaterialDescFlags, PackedLayerDesc,
    PackedLayerValues, PackedMaterialDesc, PackedMaterialValues, MATERIAL_DATA_SIZE,
    MATERIAL_TEXTURE_COUNT, MAX_LAYERS, NUM_LAYER_TYPES,
};
pub use layer::{Layer, LayerBlend, LayerStack, LayerType, Ndf};
pub use material::Material;
pub use system::{DescriptorId, MaterialSystem};
