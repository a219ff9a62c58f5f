//! Alsvid circuit analysis and optimisation
//!
//! This crate holds everything that rewrites circuits: the composable
//! [`Transform`] scaffolding, the Clifford [`UnitaryTableau`], the
//! [`PauliGraph`] commutation structure with its synthesis strategies,
//! and the concrete optimisation passes built on the rewrite primitives
//! of `alsvid-ir`.
//!
//! # Overview
//!
//! A [`Transform`] maps a circuit to a changed-flag and composes by
//! sequencing (`a.then(b)`), fixed-point repetition (`repeat`) and
//! predicate-guarded repetition (`repeat_until`). The concrete passes:
//!
//! - [`clifford::multiq_clifford_replacement`]: CX-pair rewrites with
//!   causal commutation checks.
//! - [`clifford::copy_pi_through_cx`]: Pauli copies backwards through
//!   CX gates.
//! - [`clifford::singleq_clifford_sweep`]: canonical
//!   `(Z?, X?, S?, V?, S?)` form for single-qubit Clifford segments.
//! - [`clifford::push_cliffords_through_measures`]: terminal Clifford
//!   regions pushed past the measurement boundary.
//! - [`synth::pauli_simp`]: resynthesis through the Pauli graph with
//!   `Individual`/`Pairwise`/`Sets` strategies.
//! - [`decompose::decompose_boxes`]: box lowering to primitive gates.
//!
//! # Example: fixed-point optimisation
//!
//! ```rust
//! use alsvid_compile::clifford::multiq_clifford_replacement;
//! use alsvid_ir::{Circuit, OpType};
//!
//! let mut circ = Circuit::with_size(2, 0);
//! circ.cx(0, 1).unwrap();
//! circ.cx(0, 1).unwrap();
//!
//! let pass = multiq_clifford_replacement(false).repeat();
//! assert!(pass.apply(&mut circ).unwrap());
//! assert_eq!(circ.count_gates(OpType::CX, false), 0);
//! ```

pub mod clifford;
pub mod decompose;
pub mod error;
pub mod pauligraph;
pub mod synth;
pub mod tableau;
pub mod transform;
pub mod unitary;

pub use error::{CompileError, CompileResult};
pub use pauligraph::{PauliGraph, PauliRotation};
pub use synth::{CXConfig, SynthStrategy, pauli_simp, synthesise_pauli_graph};
pub use tableau::{PauliRow, UnitaryTableau};
pub use transform::Transform;
