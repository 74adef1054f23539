//! Lazily recomputed derived values.
//!
//! This module provides [`Derived<T>`], a two-state cell for data that is
//! computed from other state and only rebuilt when something actually
//! changed. Instead of a separate `dirty: bool` flag next to the cached
//! value, the cell itself is either:
//!
//! - [`Fresh`](Derived::Fresh) — the derived value is up to date
//! - [`Stale`](Derived::Stale) — an input changed; the value must be
//!   recomputed before use (the old allocation is kept for reuse)
//!
//! # Example
//!
//! ```
//! use lantern_core::derived::Derived;
//!
//! let mut cache = Derived::<Vec<u32>>::default(); // starts Stale
//! assert!(cache.is_stale());
//!
//! let values = cache.refresh_with(|v| {
//!     v.clear();
//!     v.extend_from_slice(&[1, 2, 3]);
//! });
//! assert_eq!(values, &[1, 2, 3]);
//! assert!(cache.is_fresh());
//!
//! // A second refresh without invalidation does not run the closure.
//! cache.refresh_with(|_| unreachable!());
//!
//! cache.invalidate();
//! assert!(cache.is_stale());
//! ```

/// A cached derived value that is either up to date or awaiting recompute.
///
/// Both states carry the value so that the allocation survives
/// invalidation; a stale value must not be read as if it were current.
#[derive(Debug)]
pub enum Derived<T> {
    /// An input changed since the value was last computed.
    Stale(T),
    /// The value reflects the current inputs.
    Fresh(T),
}

impl<T> Derived<T> {
    /// Create a cell in the fresh state with an already computed value.
    pub fn fresh(value: T) -> Self {
        Self::Fresh(value)
    }

    /// Check if the value is up to date.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// Check if the value must be recomputed before use.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    /// Get a reference to the value if it is fresh.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Fresh(v) => Some(v),
            Self::Stale(_) => None,
        }
    }

    /// Get a reference to the inner value regardless of state.
    ///
    /// Callers must not treat a stale value as current; this accessor exists
    /// for inspection and allocation reuse.
    pub fn inner(&self) -> &T {
        match self {
            Self::Fresh(v) | Self::Stale(v) => v,
        }
    }

    /// Get a mutable reference to the inner value regardless of state.
    pub fn inner_mut(&mut self) -> &mut T {
        match self {
            Self::Fresh(v) | Self::Stale(v) => v,
        }
    }
}

impl<T: Default> Derived<T> {
    /// Mark the value as needing recomputation. No-op if already stale.
    ///
    /// The current value (and its allocations) is kept for the next refresh.
    pub fn invalidate(&mut self) {
        if matches!(self, Self::Fresh(_)) {
            let taken = std::mem::replace(self, Self::Stale(T::default()));
            if let Self::Fresh(v) = taken {
                *self = Self::Stale(v);
            }
        }
    }

    /// Recompute the value if stale, then return a reference to it.
    ///
    /// The closure receives the previous value for in-place rebuild. If the
    /// cell is already fresh the closure is not called.
    pub fn refresh_with(&mut self, f: impl FnOnce(&mut T)) -> &T {
        if self.is_stale() {
            let taken = std::mem::replace(self, Self::Fresh(T::default()));
            let (Self::Stale(mut v) | Self::Fresh(mut v)) = taken;
            f(&mut v);
            *self = Self::Fresh(v);
        }
        self.inner()
    }

    /// Fallible variant of [`refresh_with`](Self::refresh_with).
    ///
    /// If the closure fails the cell stays stale, so the next read retries
    /// the recomputation.
    pub fn try_refresh_with<E>(
        &mut self,
        f: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<&T, E> {
        if self.is_stale() {
            let taken = std::mem::replace(self, Self::Stale(T::default()));
            let (Self::Stale(mut v) | Self::Fresh(mut v)) = taken;
            match f(&mut v) {
                Ok(()) => *self = Self::Fresh(v),
                Err(e) => {
                    *self = Self::Stale(v);
                    return Err(e);
                }
            }
        }
        Ok(self.inner())
    }
}

impl<T: Default> Default for Derived<T> {
    fn default() -> Self {
        Self::Stale(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stale() {
        let cell = Derived::<Vec<u8>>::default();
        assert!(cell.is_stale());
        assert!(cell.get().is_none());
    }

    #[test]
    fn fresh_constructor() {
        let cell = Derived::fresh(vec![1, 2, 3]);
        assert!(cell.is_fresh());
        assert_eq!(cell.get().unwrap(), &vec![1, 2, 3]);
    }

    #[test]
    fn refresh_runs_once() {
        let mut cell = Derived::<u32>::default();
        let mut runs = 0;
        cell.refresh_with(|v| {
            runs += 1;
            *v = 42;
        });
        cell.refresh_with(|_| {
            runs += 1;
        });
        assert_eq!(runs, 1);
        assert_eq!(cell.get(), Some(&42));
    }

    #[test]
    fn invalidate_triggers_recompute_and_keeps_value() {
        let mut cell = Derived::fresh(vec![1, 2, 3]);
        cell.invalidate();
        assert!(cell.is_stale());
        // Previous contents are available for in-place rebuild.
        assert_eq!(cell.inner(), &vec![1, 2, 3]);

        let rebuilt = cell.refresh_with(|v| v.push(4));
        assert_eq!(rebuilt, &vec![1, 2, 3, 4]);
    }

    #[test]
    fn invalidate_on_stale_is_noop() {
        let mut cell = Derived::<u32>::default();
        cell.invalidate();
        assert!(cell.is_stale());
    }

    #[test]
    fn failed_refresh_stays_stale() {
        let mut cell = Derived::<u32>::default();
        let result: Result<&u32, &str> = cell.try_refresh_with(|_| Err("nope"));
        assert!(result.is_err());
        assert!(cell.is_stale());

        let result: Result<&u32, &str> = cell.try_refresh_with(|v| {
            *v = 7;
            Ok(())
        });
        assert_eq!(result.unwrap(), &7);
        assert!(cell.is_fresh());
    }

    #[test]
    fn allocation_preserved_across_invalidate() {
        let mut cell = Derived::fresh(Vec::with_capacity(100));
        cell.inner_mut().extend_from_slice(&[1u8; 100]);
        cell.invalidate();
        cell.refresh_with(|v| v.clear());
        assert!(cell.inner().capacity() >= 100);
    }
}
