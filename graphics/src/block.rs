//! Parameter block staging and shader layout validation.
//!
//! A [`ParameterBlockData`] is a CPU-side staging blob that mirrors a shader
//! parameter block. Code that fills one looks up member offsets through a
//! [`BlockReflection`] rather than hard-coding them, so a shader-side layout
//! change is caught at validation time instead of corrupting data silently.

use crate::error::GraphicsError;

/// Reflection over a shader parameter block layout.
///
/// Implementations come from shader metadata in a full pipeline; tests and
/// offline tools use [`StaticReflection`].
pub trait BlockReflection {
    /// Byte offset of a named member, if present.
    fn find_member(&self, name: &str) -> Option<usize>;

    /// Total size of the block in bytes.
    fn byte_size(&self) -> usize;
}

/// A [`BlockReflection`] backed by a static member table.
#[derive(Debug, Clone)]
pub struct StaticReflection {
    members: &'static [(&'static str, usize)],
    size: usize,
}

impl StaticReflection {
    /// Build a reflection from `(name, offset)` pairs and a total size.
    pub const fn new(members: &'static [(&'static str, usize)], size: usize) -> Self {
        Self { members, size }
    }
}

impl BlockReflection for StaticReflection {
    fn find_member(&self, name: &str) -> Option<usize> {
        self.members
            .iter()
            .find(|(member, _)| *member == name)
            .map(|&(_, offset)| offset)
    }

    fn byte_size(&self) -> usize {
        self.size
    }
}

/// Check that CPU-side member offsets agree with a shader reflection.
///
/// `actual` pairs each member name with the offset the CPU struct places it
/// at (typically from `core::mem::offset_of!`).
pub fn validate_layout(
    reflection: &impl BlockReflection,
    actual: &[(&'static str, usize)],
) -> Result<(), GraphicsError> {
    for &(member, actual_offset) in actual {
        let expected = reflection
            .find_member(member)
            .ok_or_else(|| GraphicsError::BindingNotFound(member.to_string()))?;
        if expected != actual_offset {
            return Err(GraphicsError::LayoutMismatch {
                member,
                expected,
                actual: actual_offset,
            });
        }
    }
    Ok(())
}

/// CPU-side staging data for a shader parameter block.
///
/// Upload to the GPU happens elsewhere; this type only assembles bytes.
#[derive(Debug, Clone, Default)]
pub struct ParameterBlockData {
    bytes: Vec<u8>,
}

impl ParameterBlockData {
    /// Empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled block of the given size.
    pub fn with_size(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Resize to `size` bytes, zero-filling any growth.
    pub fn resize(&mut self, size: usize) {
        self.bytes.resize(size, 0);
    }

    /// Drop all contents.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// The staged bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the staged data in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Copy raw bytes into the block at `offset`.
    ///
    /// The write must fit inside the current size.
    pub fn set_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), GraphicsError> {
        let end = offset + data.len();
        if end > self.bytes.len() {
            return Err(GraphicsError::CapacityExceeded {
                what: "parameter block",
                capacity: self.bytes.len(),
            });
        }
        self.bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Copy a plain-old-data value into the block at `offset`.
    pub fn set_pod<T: bytemuck::Pod>(
        &mut self,
        offset: usize,
        value: &T,
    ) -> Result<(), GraphicsError> {
        self.set_bytes(offset, bytemuck::bytes_of(value))
    }

    /// Copy a value at the offset a reflection reports for `member`.
    pub fn set_member<T: bytemuck::Pod>(
        &mut self,
        reflection: &impl BlockReflection,
        member: &str,
        value: &T,
    ) -> Result<(), GraphicsError> {
        let offset = reflection
            .find_member(member)
            .ok_or_else(|| GraphicsError::BindingNotFound(member.to_string()))?;
        self.set_pod(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_REFLECTION: StaticReflection =
        StaticReflection::new(&[("count", 0), ("scale", 4)], 16);

    #[test]
    fn static_reflection_lookup() {
        assert_eq!(TEST_REFLECTION.find_member("count"), Some(0));
        assert_eq!(TEST_REFLECTION.find_member("scale"), Some(4));
        assert_eq!(TEST_REFLECTION.find_member("missing"), None);
    }

    #[test]
    fn validate_layout_accepts_matching_offsets() {
        assert!(validate_layout(&TEST_REFLECTION, &[("count", 0), ("scale", 4)]).is_ok());
    }

    #[test]
    fn validate_layout_rejects_wrong_offset() {
        let err = validate_layout(&TEST_REFLECTION, &[("scale", 8)]).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::LayoutMismatch {
                member: "scale",
                expected: 4,
                actual: 8,
            }
        );
    }

    #[test]
    fn validate_layout_rejects_unknown_member() {
        let err = validate_layout(&TEST_REFLECTION, &[("missing", 0)]).unwrap_err();
        assert_eq!(err, GraphicsError::BindingNotFound("missing".to_string()));
    }

    #[test]
    fn set_member_writes_at_reflected_offset() {
        let mut block = ParameterBlockData::with_size(16);
        block
            .set_member(&TEST_REFLECTION, "scale", &2.0f32)
            .unwrap();
        assert_eq!(&block.bytes()[4..8], 2.0f32.to_ne_bytes().as_slice());
    }

    #[test]
    fn out_of_bounds_write_fails() {
        let mut block = ParameterBlockData::with_size(4);
        assert!(block.set_pod(2, &0u32).is_err());
    }
}
