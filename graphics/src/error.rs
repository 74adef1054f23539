//! Graphics error types.

use std::fmt;

/// Errors that can occur in the material and lighting systems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A fixed-capacity container is full.
    CapacityExceeded {
        /// What ran out of space.
        what: &'static str,
        /// The capacity that was exceeded.
        capacity: usize,
    },
    /// Geometry has a shape the operation cannot handle.
    UnsupportedTopology(String),
    /// A CPU-side struct layout does not match the shader's expectation.
    LayoutMismatch {
        /// Shader-side member name.
        member: &'static str,
        /// Offset the shader expects.
        expected: usize,
        /// Offset the CPU struct actually has.
        actual: usize,
    },
    /// A named binding was not found in a parameter block.
    BindingNotFound(String),
    /// Energy values sum to zero or are otherwise unusable.
    DegenerateEnergy(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { what, capacity } => {
                write!(f, "capacity exceeded: {what} holds at most {capacity}")
            }
            Self::UnsupportedTopology(msg) => write!(f, "unsupported topology: {msg}"),
            Self::LayoutMismatch {
                member,
                expected,
                actual,
            } => write!(
                f,
                "layout mismatch: member {member} expected at offset {expected}, found at {actual}"
            ),
            Self::BindingNotFound(name) => write!(f, "binding not found: {name}"),
            Self::DegenerateEnergy(msg) => write!(f, "degenerate energy: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
