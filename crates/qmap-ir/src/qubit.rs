//! Virtual and physical qubit identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qubit identifier as assigned by the upstream circuit.
///
/// Virtual qubits keep their identity for the lifetime of a circuit; the
/// mapper decides which [`PhysicalQubit`] holds each of them at any point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VirtualQubit(pub u32);

impl VirtualQubit {
    /// The identifier as a vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VirtualQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for VirtualQubit {
    fn from(id: u32) -> Self {
        VirtualQubit(id)
    }
}

/// Hardware qubit identifier, 0-indexed and bounded by the device size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PhysicalQubit(pub u32);

impl PhysicalQubit {
    /// The identifier as a vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhysicalQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl From<u32> for PhysicalQubit {
    fn from(id: u32) -> Self {
        PhysicalQubit(id)
    }
}

impl From<usize> for PhysicalQubit {
    fn from(id: usize) -> Self {
        PhysicalQubit(u32::try_from(id).expect("PhysicalQubit overflow: exceeds u32::MAX"))
    }
}
