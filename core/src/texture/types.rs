//! CPU-side texture data and format definitions.

/// Texture pixel format.
///
/// The `Bgrx` variants carry four bytes per pixel but only three color
/// channels; the fourth byte is padding rather than data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// Single 8-bit channel.
    R8Unorm,
    /// Two 8-bit channels.
    Rg8Unorm,
    /// Four 8-bit channels, linear.
    #[default]
    Rgba8Unorm,
    /// Four 8-bit channels, sRGB.
    Rgba8UnormSrgb,
    /// Four 8-bit channels, BGRA order, linear.
    Bgra8Unorm,
    /// Four 8-bit channels, BGRA order, sRGB.
    Bgra8UnormSrgb,
    /// Three color channels padded to four bytes, linear.
    Bgrx8Unorm,
    /// Three color channels padded to four bytes, sRGB.
    Bgrx8UnormSrgb,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// Four 32-bit float channels.
    Rgba32Float,
}

impl TextureFormat {
    /// Number of meaningful channels in the format.
    pub fn channel_count(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm => 2,
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Bgrx8Unorm
            | Self::Bgrx8UnormSrgb
            | Self::Rgba16Float
            | Self::Rgba32Float => 4,
        }
    }

    /// Whether the fourth channel is padding rather than data.
    pub fn is_bgrx(&self) -> bool {
        matches!(self, Self::Bgrx8Unorm | Self::Bgrx8UnormSrgb)
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm => 2,
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Bgrx8Unorm
            | Self::Bgrx8UnormSrgb => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

/// CPU-side 2D texture holding raw pixel data.
///
/// This is a format-agnostic container; the material system only inspects
/// format and presence, never pixel contents. Shared across materials and
/// lights via `Arc`.
#[derive(Debug, Clone)]
pub struct CpuTexture {
    /// Texture name.
    pub name: Option<String>,
    /// Pixel format.
    pub format: TextureFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel bytes (`width * height * bytes_per_pixel`).
    pub data: Vec<u8>,
}

impl CpuTexture {
    /// Create a texture with zero-initialized pixel data.
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        let size = (width * height * format.bytes_per_pixel()) as usize;
        Self {
            name: None,
            format,
            width,
            height,
            data: vec![0; size],
        }
    }

    /// Set the texture name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the pixel data. Length must match the texture dimensions.
    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            (self.width * self.height * self.format.bytes_per_pixel()) as usize
        );
        self.data = data;
        self
    }

    /// Size of the pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}
