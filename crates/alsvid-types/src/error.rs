//! Error types for the types crate.

use thiserror::Error;

/// Errors from fallible Pauli tensor casts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CastError {
    /// A complex coefficient is not a power of i.
    #[error("coefficient is not a power of i, cannot cast to quarter turns")]
    NonPowerOfI,

    /// A symbolic coefficient has unbound symbols.
    #[error("symbolic coefficient has free symbols, cannot evaluate")]
    UnevaluatedSymbol,

    /// A sparse Pauli string uses qubits outside the default register.
    #[error("qubit {unit} is not a default-register qubit, cannot cast to a dense string")]
    NonDefaultRegister {
        /// Offending unit, rendered.
        unit: String,
    },
}

/// Errors from the symbol registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SymbolError {
    /// The requested symbol name cannot be used.
    #[error("symbol name {name:?} is not printable")]
    SymbolClash {
        /// The rejected name.
        name: String,
    },
}

/// Errors from register shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegisterError {
    /// Two units share a register name but disagree on kind or arity.
    #[error("register '{register}' used with inconsistent kind or index arity")]
    InconsistentRegister {
        /// The register name.
        register: String,
    },
}
