//! Error types for the IR crate.

use alsvid_types::UnitId;
use thiserror::Error;

use crate::op::OpType;
use crate::wire::WireType;

/// Errors that can occur while building or rewriting circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// A unit referenced by an operation is not in the circuit.
    #[error("unit {unit} not found in circuit{}", format_op_context(.op))]
    UnitNotFound {
        /// The missing unit.
        unit: UnitId,
        /// Optional operation context.
        op: Option<OpType>,
    },

    /// The argument list does not match the operation signature.
    #[error("operation {op:?} expects {expected} arguments, got {got}")]
    InvalidArguments {
        /// The operation.
        op: OpType,
        /// Expected argument count.
        expected: usize,
        /// Provided argument count.
        got: usize,
    },

    /// An edge was added between ports of incompatible wire types.
    #[error("edge of type {edge:?} does not match port of type {port:?}")]
    InvalidEdgeType {
        /// The edge's wire type.
        edge: WireType,
        /// The port's wire type.
        port: WireType,
    },

    /// A register or unit with this name already exists.
    #[error("register '{0}' already exists")]
    DuplicateRegister(String),

    /// A unit with this id already exists.
    #[error("unit {0} already present in circuit")]
    DuplicateUnit(UnitId),

    /// Append arguments do not line up with the appended circuit's units.
    #[error("unit mismatch: {0}")]
    UnitMismatch(String),

    /// A replacement's boundary does not match the substituted region.
    #[error("substitution mismatch: {0}")]
    SubstitutionMismatch(String),

    /// A named substitution would introduce a colliding opgroup.
    #[error("opgroup collision: '{0}' already present in host circuit")]
    OpGroupCollision(String),

    /// Slicing found a write to a bit that still has pending readers.
    #[error("read-after-write hazard on bit {0}")]
    RawHazard(UnitId),

    /// The circuit cannot be wrapped in the requested condition.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// A conditional value is out of range for its width.
    #[error("condition value {value} out of range for width {width}")]
    ConditionValueOutOfRange {
        /// Condition value.
        value: u64,
        /// Number of condition bits.
        width: u32,
    },

    /// Generic structural misuse of the circuit API.
    #[error("invalid circuit operation: {0}")]
    CircuitInvalidity(String),

    /// Malformed serialized circuit.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

fn format_op_context(op: &Option<OpType>) -> String {
    match op {
        Some(op) => format!(" (op: {op:?})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, CircuitError>;
