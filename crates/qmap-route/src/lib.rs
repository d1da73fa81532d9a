//! qmap Placement and Routing
//!
//! This crate maps a stream of operations on virtual qubits onto a quantum
//! device whose two-qubit gates only work between linked physical qubits.
//!
//! # Overview
//!
//! Mapping runs in two phases:
//! 1. **Placement**: Buffer a prefix of the stream and choose an initial
//!    virtual-to-physical assignment that keeps interacting qubits close
//! 2. **Routing**: Rewrite each operation onto physical qubits, inserting
//!    swaps whenever a two-qubit gate spans qubits without a link
//!
//! # Architecture
//!
//! ```text
//! OperationSource (virtual ops)
//!       |
//!       v
//! +--------------+
//! | MappingStage | <-- Topology, MapperConfig
//! +--------------+
//!       |
//!       |-- Placer (HeuristicPlacement / IdentityPlacement)
//!       |-- LookaheadWindow
//!       +-- Router (swap insertion)
//!       |
//!       v
//! OperationSink / Iterator (physical ops, swaps included)
//! ```
//!
//! # Example
//!
//! ```rust
//! use qmap_ir::{PhysicalOperation, PhysicalQubit, VirtualOperation, VirtualQubit};
//! use qmap_route::{MapperConfig, PlacementStrategy, Topology, map_circuit};
//!
//! let topology = Topology::linear(3).unwrap();
//! let config = MapperConfig::new().with_placement(PlacementStrategy::Identity);
//! let circuit = [VirtualOperation::two_qubit_gate("cx", VirtualQubit(0), VirtualQubit(2))];
//!
//! let mapped = map_circuit(&topology, circuit, &config).unwrap();
//! assert_eq!(
//!     mapped.operations,
//!     vec![
//!         PhysicalOperation::swap(PhysicalQubit(0), PhysicalQubit(1)),
//!         PhysicalOperation::two_qubit_gate("cx", PhysicalQubit(1), PhysicalQubit(2)),
//!     ]
//! );
//! ```
//!
//! # Guarantees
//!
//! - Every emitted two-qubit gate and swap acts on linked physical qubits
//! - Operations leave in the order they arrived; swaps only precede the
//!   operation they make executable
//! - The same input, topology and configuration always give the same output

pub mod config;
pub mod error;
pub mod mapping;
pub mod placement;
pub mod router;
pub mod stream;
pub mod topology;
pub mod window;

pub use config::{MapperConfig, PlacementStrategy};
pub use error::{RouteError, RouteResult};
pub use mapping::Mapping;
pub use placement::{
    HeuristicPlacement, IdentityPlacement, InteractionGraph, Placer, allocate_late,
};
pub use router::{Router, RoutingStats};
pub use stream::{
    IterSource, MappedCircuit, MappingStage, OperationSink, OperationSource, map_circuit,
};
pub use topology::{Topology, TopologySpec};
pub use window::LookaheadWindow;
