//! CPU-side mesh data and instances.
//!
//! [`CpuMesh`] holds immutable geometry; [`MeshInstance`] pairs a shared mesh
//! with a mutable world transform. Simple generators for test and demo
//! geometry live in [`generators`].

mod data;
pub mod generators;

pub use data::{CpuMesh, MeshInstance, PrimitiveTopology};
