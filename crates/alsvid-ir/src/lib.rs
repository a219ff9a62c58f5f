//! Alsvid circuit intermediate representation
//!
//! This crate provides the DAG-based circuit model at the heart of the
//! Alsvid compilation stack: typed wires, a polymorphic operation
//! hierarchy, layered slicing, a command view and the rewrite primitives
//! the optimisation passes are built on.
//!
//! # Core components
//!
//! - **Wires**: [`WireType`]: quantum, classical, Boolean (read-only
//!   fan-out), WASM state and RNG state.
//! - **Operations**: [`Op`]: primitive gates, barriers, conditionals,
//!   boxes (nested circuits, matrices, Pauli exponentials, multiplexors),
//!   classical ops and external WASM calls, all tagged by [`OpType`].
//! - **Circuit**: [`Circuit`]: the DAG with an insertion-ordered
//!   boundary of named [`UnitId`]s and a symbolic global phase.
//! - **Slicing**: [`SliceIterator`]: lazy maximal-antichain layers with
//!   mixed quantum/classical hazard tracking.
//! - **Commands**: [`Command`]: vertices paired with their unit
//!   arguments in deterministic order.
//! - **Rewrites**: [`Subcircuit`] substitution, vertex removal and
//!   rewiring, opgroup-scoped substitution.
//! - **JSON**: round-trip serialization in [`json`].
//!
//! # Example: building and slicing
//!
//! ```rust
//! use alsvid_ir::Circuit;
//!
//! let mut circ = Circuit::with_size(3, 0);
//! circ.cx(0, 1).unwrap();
//! circ.cx(1, 2).unwrap();
//!
//! // The CXs share a qubit, so they land in successive slices.
//! assert_eq!(circ.depth().unwrap(), 2);
//! ```
//!
//! [`UnitId`]: alsvid_types::UnitId

pub mod circpool;
pub mod circuit;
pub mod command;
pub mod error;
pub mod json;
pub mod op;
pub mod slice;
pub mod wire;

pub use circuit::{
    Circuit, EdgeIndex, GraphRewiring, NodeIndex, Subcircuit, Vertex, VertexDeletion, Wire,
};
pub use command::Command;
pub use error::{CircuitError, IrResult};
pub use op::{ClassicalOp, Conditional, Op, OpType, WasmOp};
pub use slice::{CutFrontier, Slice, SliceIterator};
pub use wire::WireType;
