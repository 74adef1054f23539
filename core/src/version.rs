//! Monotonic version counters for cheap change detection.
//!
//! A [`VersionId`] answers "did this change since I last looked?" without a
//! deep comparison: every externally observable mutation bumps the owner's
//! counter, and an observer only has to remember the last value it saw.

/// A monotonically increasing version counter.
///
/// Values are never reused and only ever grow. The default value is the
/// "never observed" sentinel; a freshly constructed entity should start at
/// [`VersionId::INITIAL`] so that a first observation always registers as a
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionId(u64);

impl VersionId {
    /// Version of a freshly constructed entity.
    pub const INITIAL: VersionId = VersionId(1);

    /// Increment the counter and return the new value.
    pub fn bump(&mut self) -> VersionId {
        self.0 += 1;
        *self
    }

    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}
