//! Sampler state descriptions.
//!
//! A [`CpuSampler`] describes how textures are filtered and addressed. It is
//! pure data shared via `Arc`; resource creation happens elsewhere.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Linear interpolation between texels.
    #[default]
    Linear,
}

/// Texture coordinate addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Coordinates wrap around.
    #[default]
    Repeat,
    /// Coordinates are mirrored at integer boundaries.
    MirrorRepeat,
    /// Coordinates are clamped to the edge texel.
    ClampToEdge,
}

/// A sampler state description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuSampler {
    /// Filtering when the texture is minified.
    pub min_filter: FilterMode,
    /// Filtering when the texture is magnified.
    pub mag_filter: FilterMode,
    /// Filtering between mip levels.
    pub mip_filter: FilterMode,
    /// Addressing along U.
    pub address_u: AddressMode,
    /// Addressing along V.
    pub address_v: AddressMode,
    /// Maximum anisotropy (1 disables anisotropic filtering).
    pub max_anisotropy: u8,
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::linear()
    }
}

impl CpuSampler {
    /// Trilinear sampler with repeat addressing.
    pub fn linear() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mip_filter: FilterMode::Linear,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            max_anisotropy: 1,
        }
    }

    /// Point sampler with repeat addressing.
    pub fn nearest() -> Self {
        Self {
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            mip_filter: FilterMode::Nearest,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            max_anisotropy: 1,
        }
    }

    /// Set both U and V addressing.
    #[must_use]
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_u = mode;
        self.address_v = mode;
        self
    }

    /// Set the maximum anisotropy.
    #[must_use]
    pub fn with_max_anisotropy(mut self, max_anisotropy: u8) -> Self {
        self.max_anisotropy = max_anisotropy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_linear() {
        assert_eq!(CpuSampler::default(), CpuSampler::linear());
    }

    #[test]
    fn builders_compose() {
        let sampler = CpuSampler::nearest()
            .with_address_mode(AddressMode::ClampToEdge)
            .with_max_anisotropy(8);
        assert_eq!(sampler.min_filter, FilterMode::Nearest);
        assert_eq!(sampler.address_u, AddressMode::ClampToEdge);
        assert_eq!(sampler.address_v, AddressMode::ClampToEdge);
        assert_eq!(sampler.max_anisotropy, 8);
    }
}
