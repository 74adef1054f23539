//! # Lantern Core
//!
//! Core crate for Lantern: CPU-side, GPU-agnostic rendering data types and
//! the small utilities shared by the material and light systems.

pub mod derived;
pub mod math;
pub mod mesh;
pub mod sampler;
pub mod texture;
pub mod version;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder for future engine-wide initialization
pub fn init() {
    log::info!("Lantern Core v{} initialized", VERSION);
}
