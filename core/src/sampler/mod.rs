//! CPU-side sampler state descriptions.

mod types;

pub use types::{AddressMode, CpuSampler, FilterMode};
