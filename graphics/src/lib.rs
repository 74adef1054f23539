//! # Lantern Graphics
//!
//! CPU-side scene composition for the Lantern renderer: layered materials,
//! light sources, and the change tracking that keeps their GPU-facing data
//! up to date with minimal rebuilds.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`materials`] - Layered material model, descriptor interning, and the
//!   material system shared across a scene
//! - [`lights`] - Analytic and mesh-backed light sources plus the aggregate
//!   light environment
//! - [`block`] - Parameter block staging and shader layout validation
//!
//! ## Example
//!
//! ```ignore
//! use lantern_graphics::{Layer, Material, MaterialSystem};
//!
//! let system = MaterialSystem::shared();
//! let mut material = Material::new("gold", system);
//! material.add_layer(Layer::conductor())?;
//! material.finalize()?;
//! ```

pub mod block;
pub mod error;
pub mod lights;
pub mod materials;

// Re-export main types for convenience
pub use block::{BlockReflection, ParameterBlockData};
pub use error::GraphicsError;
pub use lights::{AreaSampling, Light, LightData, LightEnvironment, LightType};
pub use materials::{
    DescriptorId, Layer, LayerBlend, LayerStack, LayerType, Material, MaterialData,
    MaterialSystem, Ndf,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Lantern Graphics v{} initialized", VERSION);
}
