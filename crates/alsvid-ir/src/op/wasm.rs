//! Opaque external WASM operations.

use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, IrResult};
use crate::wire::WireType;

/// A call into a WASM module function, acting on classical bits grouped
/// into i32 arguments, plus threaded WASM-state wires for ordering.
///
/// The op is opaque to the compiler: it is never evaluated, daggered or
/// substituted, only scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasmOp {
    /// Total number of classical bits (inputs then outputs).
    pub n: u32,
    /// Number of WASM-state wires threaded through the call.
    pub n_wires: u32,
    /// Bit widths of the input i32 groups.
    pub widths_in: Vec<u32>,
    /// Bit widths of the output i32 groups.
    pub widths_out: Vec<u32>,
    /// Name of the called function.
    pub func_name: String,
    /// Identifier of the WASM module holding the function.
    pub module_id: String,
}

impl WasmOp {
    /// Create a WASM op, validating that the group widths cover `n`.
    pub fn new(
        n: u32,
        n_wires: u32,
        widths_in: Vec<u32>,
        widths_out: Vec<u32>,
        func_name: impl Into<String>,
        module_id: impl Into<String>,
    ) -> IrResult<Self> {
        let total: u32 = widths_in.iter().chain(widths_out.iter()).sum();
        if total != n {
            return Err(CircuitError::CircuitInvalidity(format!(
                "WASM op width groups cover {total} bits but {n} were declared"
            )));
        }
        Ok(Self {
            n,
            n_wires,
            widths_in,
            widths_out,
            func_name: func_name.into(),
            module_id: module_id.into(),
        })
    }

    /// Number of i32 arguments (input and output groups).
    pub fn n_i32(&self) -> u32 {
        (self.widths_in.len() + self.widths_out.len()) as u32
    }

    /// WASM ops are external calls.
    pub fn is_extern(&self) -> bool {
        true
    }

    /// Signature: classical bit wires followed by WASM-state wires.
    pub fn signature(&self) -> Vec<WireType> {
        let mut sig = vec![WireType::Classical; self.n as usize];
        sig.extend(vec![WireType::Wasm; self.n_wires as usize]);
        sig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths_must_cover_bits() {
        assert!(WasmOp::new(6, 1, vec![2, 2], vec![2], "f", "m").is_ok());
        assert!(WasmOp::new(5, 1, vec![2, 2], vec![2], "f", "m").is_err());
    }

    #[test]
    fn test_signature() {
        let op = WasmOp::new(3, 2, vec![2], vec![1], "f", "m").unwrap();
        assert!(op.is_extern());
        assert_eq!(
            op.signature(),
            vec![
                WireType::Classical,
                WireType::Classical,
                WireType::Classical,
                WireType::Wasm,
                WireType::Wasm,
            ]
        );
        assert_eq!(op.n_i32(), 2);
    }
}
