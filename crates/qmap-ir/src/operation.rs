//! Operations combining a kind with qubit operands and an opaque payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::qubit::{PhysicalQubit, VirtualQubit};

/// The kind of an operation.
///
/// The mapper never interprets gate semantics: it only distinguishes gates
/// (which need their operands adjacent when they act on two qubits) from
/// directives that act on each operand independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// A named gate with one or two operands.
    Gate(String),
    /// Measurement of any number of qubits, each measured independently.
    Measure,
    /// Scheduling barrier over any number of qubits.
    Barrier,
    /// Routing swap. Reserved for operations inserted by the router.
    Swap,
}

impl OperationKind {
    /// Short name of the kind, as used in logs and error messages.
    pub fn name(&self) -> &str {
        match self {
            OperationKind::Gate(name) => name,
            OperationKind::Measure => "measure",
            OperationKind::Barrier => "barrier",
            OperationKind::Swap => "swap",
        }
    }
}

/// An operation over qubits of type `Q`.
///
/// Upstream circuits produce [`VirtualOperation`]s; the mapper emits
/// [`PhysicalOperation`]s with the same kind and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation<Q> {
    /// The kind of operation.
    pub kind: OperationKind,
    /// Ordered qubit operands.
    pub qubits: Vec<Q>,
    /// Opaque data (angles, classical conditions, ...) carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// An operation over virtual qubits, as produced upstream.
pub type VirtualOperation = Operation<VirtualQubit>;

/// An operation over physical qubits, as emitted downstream.
pub type PhysicalOperation = Operation<PhysicalQubit>;

impl<Q> Operation<Q> {
    /// Create a gate operation.
    pub fn gate(name: impl Into<String>, qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            kind: OperationKind::Gate(name.into()),
            qubits: qubits.into_iter().collect(),
            payload: None,
        }
    }

    /// Create a single-qubit gate operation.
    pub fn single_qubit_gate(name: impl Into<String>, qubit: Q) -> Self {
        Self::gate(name, [qubit])
    }

    /// Create a two-qubit gate operation.
    pub fn two_qubit_gate(name: impl Into<String>, q1: Q, q2: Q) -> Self {
        Self::gate(name, [q1, q2])
    }

    /// Create a measurement over one or more qubits.
    pub fn measure(qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            kind: OperationKind::Measure,
            qubits: qubits.into_iter().collect(),
            payload: None,
        }
    }

    /// Create a barrier over one or more qubits.
    pub fn barrier(qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            kind: OperationKind::Barrier,
            qubits: qubits.into_iter().collect(),
            payload: None,
        }
    }

    /// Attach an opaque payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Name of the operation kind.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Number of qubit operands.
    #[inline]
    pub fn arity(&self) -> usize {
        self.qubits.len()
    }

    /// Whether this is a router-inserted swap.
    pub fn is_swap(&self) -> bool {
        self.kind == OperationKind::Swap
    }

    /// Whether the two operands must sit on adjacent physical qubits.
    pub fn needs_adjacency(&self) -> bool {
        self.arity() == 2 && matches!(self.kind, OperationKind::Gate(_) | OperationKind::Swap)
    }

    /// The operand pair of a two-qubit gate, if this is one.
    pub fn qubit_pair(&self) -> Option<(&Q, &Q)> {
        if self.needs_adjacency() {
            Some((&self.qubits[0], &self.qubits[1]))
        } else {
            None
        }
    }

    /// Rewrite every operand, keeping kind and payload.
    pub fn map_qubits<R>(self, f: impl FnMut(Q) -> R) -> Operation<R> {
        Operation {
            kind: self.kind,
            qubits: self.qubits.into_iter().map(f).collect(),
            payload: self.payload,
        }
    }

    /// Fallible version of [`map_qubits`](Self::map_qubits).
    pub fn try_map_qubits<R, E>(
        self,
        f: impl FnMut(Q) -> Result<R, E>,
    ) -> Result<Operation<R>, E> {
        let qubits = self.qubits.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Operation {
            kind: self.kind,
            qubits,
            payload: self.payload,
        })
    }
}

impl<Q: PartialEq + fmt::Display> Operation<Q> {
    /// Check an operation arriving from upstream.
    ///
    /// Rejects reserved swaps, unnamed gates, gates without operands or
    /// wider than two qubits, and repeated operands.
    pub fn validate(&self) -> IrResult<()> {
        match &self.kind {
            OperationKind::Swap => {
                return Err(IrError::ReservedOperation(self.name().to_string()));
            }
            OperationKind::Gate(name) if name.is_empty() => {
                return Err(IrError::EmptyGateName);
            }
            OperationKind::Gate(name) if !(1..=2).contains(&self.arity()) => {
                return Err(IrError::UnsupportedArity {
                    kind: name.clone(),
                    arity: self.arity(),
                });
            }
            _ => {}
        }

        for (i, q) in self.qubits.iter().enumerate() {
            if self.qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q.to_string(),
                    kind: self.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Operation<PhysicalQubit> {
    /// Create a routing swap between two physical qubits.
    pub fn swap(p1: PhysicalQubit, p2: PhysicalQubit) -> Self {
        Self {
            kind: OperationKind::Swap,
            qubits: vec![p1, p2],
            payload: None,
        }
    }
}

impl<Q: fmt::Display> fmt::Display for Operation<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for (i, q) in self.qubits.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{q}")?;
        }
        Ok(())
    }
}
