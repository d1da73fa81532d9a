//! qmap Operation Representation
//!
//! Core data types shared by the qmap mapper and its hosts: qubit
//! identifiers for both sides of the mapping, and the [`Operation`] record
//! that flows through the stage.
//!
//! # Overview
//!
//! Upstream circuits address *virtual* qubits. The mapper places them on
//! *physical* qubits of a device and rewrites every operation accordingly,
//! inserting swaps where a two-qubit gate spans non-adjacent hardware.
//! Both sides use the same record shape, [`Operation<Q>`], parameterized by
//! the qubit id type.
//!
//! # Example
//!
//! ```rust
//! use qmap_ir::{PhysicalQubit, VirtualOperation, VirtualQubit};
//!
//! let op = VirtualOperation::two_qubit_gate("cx", VirtualQubit(0), VirtualQubit(2));
//! assert!(op.needs_adjacency());
//! op.validate().unwrap();
//!
//! // Rewrite operands once the placement is known.
//! let physical = op.map_qubits(|v| PhysicalQubit(v.0 + 1));
//! assert_eq!(physical.qubits, vec![PhysicalQubit(1), PhysicalQubit(3)]);
//! ```
//!
//! # Operation Kinds
//!
//! | Kind | Operands | Routed |
//! |------|----------|--------|
//! | `Gate` | 1 or 2 | two-qubit gates need adjacent operands |
//! | `Measure` | any | no |
//! | `Barrier` | any | no |
//! | `Swap` | 2 | inserted by the router only |

pub mod error;
pub mod operation;
pub mod qubit;

pub use error::{IrError, IrResult};
pub use operation::{Operation, OperationKind, PhysicalOperation, VirtualOperation};
pub use qubit::{PhysicalQubit, VirtualQubit};
