//! Error types for the IR crate.

use thiserror::Error;

/// Errors raised when an operation is malformed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {qubit} in operation '{kind}'")]
    DuplicateQubit {
        /// The repeated qubit id, formatted.
        qubit: String,
        /// Operation kind for context.
        kind: String,
    },

    /// A gate has no operands or more than the mapper can route.
    #[error("Gate '{kind}' has {arity} operands, expected 1 or 2")]
    UnsupportedArity {
        /// Operation kind.
        kind: String,
        /// Number of operands provided.
        arity: usize,
    },

    /// An operation of a kind only the router may produce arrived from upstream.
    #[error("Operation kind '{0}' is reserved for inserted routing operations")]
    ReservedOperation(String),

    /// A gate with no name.
    #[error("Gate name must not be empty")]
    EmptyGateName,
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
