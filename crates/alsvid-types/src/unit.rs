//! Unit identifiers for quantum, classical and WASM-state wires.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RegisterError;

/// Default register name for qubits.
pub const DEFAULT_QUBIT_REG: &str = "q";
/// Default register name for classical bits.
pub const DEFAULT_BIT_REG: &str = "c";
/// Register name for WASM state wires.
pub const WASM_STATE_REG: &str = "_w";

/// The kind of resource a [`UnitId`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// A qubit.
    Qubit,
    /// A classical bit.
    Bit,
    /// An opaque WASM module state.
    WasmState,
}

/// Identifier for a single unit (qubit, bit or WASM state) in a circuit.
///
/// A unit belongs to a named register and carries a multi-dimensional
/// index within it. Two units with the same register name must agree on
/// kind and index arity; registers themselves are implicit.
///
/// Ordering is lexicographic on `(kind, register, index)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId {
    ty: UnitType,
    reg: String,
    index: Vec<u32>,
}

impl UnitId {
    /// Create a unit id of arbitrary kind, register and index.
    pub fn new(ty: UnitType, reg: impl Into<String>, index: Vec<u32>) -> Self {
        Self {
            ty,
            reg: reg.into(),
            index,
        }
    }

    /// A qubit in a named register with a one-dimensional index.
    pub fn qubit(reg: impl Into<String>, index: u32) -> Self {
        Self::new(UnitType::Qubit, reg, vec![index])
    }

    /// A bit in a named register with a one-dimensional index.
    pub fn bit(reg: impl Into<String>, index: u32) -> Self {
        Self::new(UnitType::Bit, reg, vec![index])
    }

    /// The `index`-th qubit of the default register.
    pub fn default_qubit(index: u32) -> Self {
        Self::qubit(DEFAULT_QUBIT_REG, index)
    }

    /// The `index`-th bit of the default register.
    pub fn default_bit(index: u32) -> Self {
        Self::bit(DEFAULT_BIT_REG, index)
    }

    /// The `index`-th WASM state wire.
    pub fn wasm_state(index: u32) -> Self {
        Self::new(UnitType::WasmState, WASM_STATE_REG, vec![index])
    }

    /// The kind of this unit.
    #[inline]
    pub fn unit_type(&self) -> UnitType {
        self.ty
    }

    /// The register name.
    #[inline]
    pub fn reg_name(&self) -> &str {
        &self.reg
    }

    /// The index within the register.
    #[inline]
    pub fn index(&self) -> &[u32] {
        &self.index
    }

    /// True iff this is a qubit of the default register with a
    /// one-dimensional index.
    pub fn is_default_qubit(&self) -> bool {
        self.ty == UnitType::Qubit && self.reg == DEFAULT_QUBIT_REG && self.index.len() == 1
    }

    /// Check that this unit can coexist in a circuit with another unit of
    /// the same register name.
    pub fn check_register_shape(&self, other: &UnitId) -> Result<(), RegisterError> {
        if self.reg == other.reg && (self.ty != other.ty || self.index.len() != other.index.len()) {
            return Err(RegisterError::InconsistentRegister {
                register: self.reg.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reg)?;
        for i in &self.index {
            write!(f, "[{i}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", UnitId::default_qubit(3)), "q[3]");
        assert_eq!(
            format!("{}", UnitId::new(UnitType::Bit, "flags", vec![1, 2])),
            "flags[1][2]"
        );
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let q0 = UnitId::default_qubit(0);
        let q1 = UnitId::default_qubit(1);
        let a0 = UnitId::qubit("a", 0);
        assert!(q0 < q1);
        assert!(a0 < q0); // "a" < "q"
        // kind dominates name
        let b = UnitId::default_bit(0);
        assert!(q1 < b); // Qubit < Bit
    }

    #[test]
    fn test_register_shape_check() {
        let q = UnitId::default_qubit(0);
        let clash = UnitId::new(UnitType::Bit, DEFAULT_QUBIT_REG, vec![0]);
        assert!(q.check_register_shape(&clash).is_err());
        let ok = UnitId::default_qubit(5);
        assert!(q.check_register_shape(&ok).is_ok());
    }
}
