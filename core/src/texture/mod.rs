//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] for holding raw pixel data, along with the
//! [`TextureFormat`] enum shared between CPU and GPU code.

mod types;

pub use types::{CpuTexture, TextureFormat};
