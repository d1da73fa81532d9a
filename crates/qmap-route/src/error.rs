//! Error types for the mapping stage.

use qmap_ir::{IrError, PhysicalQubit, VirtualQubit};
use thiserror::Error;

/// Errors that abort the mapping stage.
///
/// Every variant is fatal: the stage never retries or emits a partially
/// routed operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouteError {
    /// The device description is unusable.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// The circuit needs more qubits than the device provides.
    #[error("Circuit requires {required} qubits but only {available} are available")]
    CapacityExceeded {
        /// Number of physical qubits needed.
        required: usize,
        /// Number of physical qubits on the device.
        available: u32,
    },

    /// A swap was requested between physical qubits that share no link.
    #[error("Cannot swap non-adjacent physical qubits {p1} and {p2}")]
    NonAdjacentSwap {
        /// First physical qubit.
        p1: PhysicalQubit,
        /// Second physical qubit.
        p2: PhysicalQubit,
    },

    /// The swap budget ran out before the operands became adjacent.
    #[error("Routing diverged: {qubit1} and {qubit2} still not adjacent after {swaps} swaps")]
    RoutingDiverged {
        /// Physical position of the first operand when routing stopped.
        qubit1: PhysicalQubit,
        /// Physical position of the second operand when routing stopped.
        qubit2: PhysicalQubit,
        /// Swaps inserted in the failed episode.
        swaps: usize,
    },

    /// An explicit assignment is not a valid injective mapping.
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// A virtual qubit has no physical placement.
    #[error("Virtual qubit {0} is not mapped")]
    Unmapped(VirtualQubit),

    /// Malformed operation from upstream.
    #[error("Invalid operation: {0}")]
    Ir(#[from] IrError),

    /// Upstream source or downstream sink failed.
    #[error("Stream error: {0}")]
    Stream(String),
}

impl RouteError {
    /// Stable name of the error kind, reported with the stage-abort signal.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::InvalidTopology(_) => "InvalidTopologyError",
            RouteError::CapacityExceeded { .. } => "CapacityExceededError",
            RouteError::NonAdjacentSwap { .. } => "NonAdjacentSwapError",
            RouteError::RoutingDiverged { .. } => "RoutingDivergedError",
            RouteError::InvalidMapping(_) => "InvalidMappingError",
            RouteError::Unmapped(_) => "UnmappedQubitError",
            RouteError::Ir(_) => "InvalidOperationError",
            RouteError::Stream(_) => "StreamError",
        }
    }
}

/// Result type for mapping operations.
pub type RouteResult<T> = Result<T, RouteError>;
