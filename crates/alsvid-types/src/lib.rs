//! Alsvid foundational types
//!
//! This crate holds the leaf types shared by the whole Alsvid stack:
//! unit identifiers, symbolic expressions and the Pauli tensor algebra.
//!
//! # Core components
//!
//! - **Units**: [`UnitId`] addresses a qubit, classical bit or WASM state
//!   by register name and multi-dimensional index.
//! - **Expressions**: [`Expr`] is a symbolic expression tree used for gate
//!   parameters, global phases and Pauli coefficients;
//!   [`SymbolRegistry`] hands out fresh symbol names.
//! - **Pauli algebra**: [`PauliTensor`] is generic over a string container
//!   ([`QubitPauliMap`] sparse, [`DensePauliMap`] dense) and a coefficient
//!   domain (`()`, [`QuarterTurns`], `Complex64`, [`Expr`]), with the
//!   fallible cast lattice between them.
//!
//! # Example: Pauli multiplication
//!
//! ```rust
//! use alsvid_types::{Pauli, QuarterTurns, SpPauliStabiliser, UnitId};
//!
//! let x = SpPauliStabiliser::from_pairs([(UnitId::default_qubit(0), Pauli::X)]);
//! let y = SpPauliStabiliser::from_pairs([(UnitId::default_qubit(0), Pauli::Y)]);
//!
//! // X · Y = iZ
//! let xy = x.multiply(&y);
//! assert_eq!(xy.coeff, QuarterTurns::new(1));
//! assert_eq!(xy.get(&UnitId::default_qubit(0)), Pauli::Z);
//! ```

pub mod coeff;
pub mod container;
pub mod error;
pub mod expr;
pub mod pauli;
pub mod symbol;
pub mod tensor;
pub mod unit;

pub use coeff::{Coeff, CoeffCast, QuarterTurns};
pub use container::{ContainerCast, DensePauliMap, PauliContainer, QubitPauliMap};
pub use error::{CastError, RegisterError, SymbolError};
pub use expr::Expr;
pub use pauli::Pauli;
pub use symbol::SymbolRegistry;
pub use tensor::{
    CxPauliTensor, PauliStabiliser, PauliString, PauliTensor, SpCxPauliTensor, SpPauliStabiliser,
    SpPauliString, SpSymPauliTensor, SymPauliTensor,
};
pub use unit::{DEFAULT_BIT_REG, DEFAULT_QUBIT_REG, UnitId, UnitType, WASM_STATE_REG};
