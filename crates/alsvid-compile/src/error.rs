//! Error types for the compile crate.

use alsvid_ir::{CircuitError, OpType};
use thiserror::Error;

/// Errors that can occur during analysis and transformation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Pauli-graph construction hit a non-terminal measurement.
    #[error("mid-circuit measurement is not supported")]
    MidCircuitMeasurement,

    /// An operation is not handled by the current pass.
    #[error("unsupported operation {0:?}")]
    UnsupportedOp(OpType),

    /// `repeat_until` stabilised without satisfying its predicate.
    #[error("transform stabilised without satisfying the predicate")]
    PredicateNotSatisfied,

    /// An underlying circuit edit failed.
    #[error(transparent)]
    Ir(#[from] CircuitError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
