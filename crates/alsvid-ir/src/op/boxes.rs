//! Box operations: encapsulated circuits, matrices and Pauli exponentials.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use alsvid_types::{Expr, Pauli};

use crate::circuit::Circuit;
use crate::op::Op;
use crate::op::gate::OpType;

/// An operation wrapping a nested circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircBox {
    /// The inner circuit. Never mutated after construction; clone first.
    pub circuit: Circuit,
}

/// An arbitrary unitary on 1–3 qubits, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitaryBox {
    /// Number of qubits.
    pub n_qubits: u32,
    /// Row-major `2^n × 2^n` matrix.
    pub matrix: Vec<Complex64>,
}

impl UnitaryBox {
    /// Create a unitary box.
    ///
    /// # Panics
    ///
    /// Panics if `matrix.len()` does not equal `(2^n_qubits)^2`.
    pub fn new(n_qubits: u32, matrix: Vec<Complex64>) -> Self {
        let dim = 1usize << n_qubits;
        assert_eq!(
            matrix.len(),
            dim * dim,
            "matrix length {} does not match expected {} for {}-qubit box",
            matrix.len(),
            dim * dim,
            n_qubits,
        );
        Self { n_qubits, matrix }
    }

    /// The conjugate transpose of the stored matrix.
    pub fn dagger_matrix(&self) -> Vec<Complex64> {
        let dim = 1usize << self.n_qubits;
        let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
        for r in 0..dim {
            for c in 0..dim {
                out[c * dim + r] = self.matrix[r * dim + c].conj();
            }
        }
        out
    }

    /// The transpose of the stored matrix.
    pub fn transpose_matrix(&self) -> Vec<Complex64> {
        let dim = 1usize << self.n_qubits;
        let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
        for r in 0..dim {
            for c in 0..dim {
                out[c * dim + r] = self.matrix[r * dim + c];
            }
        }
        out
    }
}

/// exp(i·A·t) for a Hermitian matrix A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpBox {
    /// Number of qubits.
    pub n_qubits: u32,
    /// Row-major Hermitian matrix.
    pub hermitian: Vec<Complex64>,
    /// The exponent scale.
    pub t: f64,
}

impl ExpBox {
    /// Create an exponential box.
    ///
    /// # Panics
    ///
    /// Panics if `hermitian.len()` does not equal `(2^n_qubits)^2`.
    pub fn new(n_qubits: u32, hermitian: Vec<Complex64>, t: f64) -> Self {
        let dim = 1usize << n_qubits;
        assert_eq!(hermitian.len(), dim * dim);
        Self {
            n_qubits,
            hermitian,
            t,
        }
    }
}

/// A single Pauli exponential `exp(−i·t·P/2)` over a dense Pauli string.
///
/// With this convention `PauliExpBox([Z], t)` is exactly `Rz(t)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliExpBox {
    /// The Pauli string, one letter per qubit.
    pub paulis: Vec<Pauli>,
    /// The rotation angle.
    pub t: Expr,
}

impl PauliExpBox {
    /// Create a Pauli exponential box.
    pub fn new(paulis: Vec<Pauli>, t: impl Into<Expr>) -> Self {
        Self {
            paulis,
            t: t.into(),
        }
    }

    /// Number of Y letters; odd counts flip the sign under transposition.
    pub fn n_ys(&self) -> usize {
        self.paulis.iter().filter(|p| **p == Pauli::Y).count()
    }
}

/// A pair of Pauli exponentials, applied first-then-second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliExpPairBox {
    /// First Pauli string.
    pub paulis0: Vec<Pauli>,
    /// First angle.
    pub t0: Expr,
    /// Second Pauli string.
    pub paulis1: Vec<Pauli>,
    /// Second angle.
    pub t1: Expr,
}

/// A set of mutually commuting Pauli exponentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliExpCommutingSetBox {
    /// The gadgets: `(string, angle)` pairs. All strings must commute.
    pub gadgets: Vec<(Vec<Pauli>, Expr)>,
}

impl PauliExpCommutingSetBox {
    /// Check pairwise commutation of the gadget strings.
    pub fn is_commuting(&self) -> bool {
        for (i, (a, _)) in self.gadgets.iter().enumerate() {
            for (b, _) in &self.gadgets[i + 1..] {
                let conflicts = a
                    .iter()
                    .zip(b.iter())
                    .filter(|(x, y)| **x != Pauli::I && **y != Pauli::I && x != y)
                    .count();
                if conflicts % 2 == 1 {
                    return false;
                }
            }
        }
        true
    }
}

/// An operation controlled on `n_controls` qubits being all-ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QControlBox {
    /// The controlled operation.
    pub op: Op,
    /// Number of control qubits, prepended to the signature.
    pub n_controls: u32,
}

/// Select-controlled operations: the branch whose selector matches the
/// little-endian control word is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplexorBox {
    /// Number of control qubits.
    pub n_controls: u32,
    /// `(selector, op)` branches. Unlisted selectors act as identity.
    pub branches: Vec<(u64, Op)>,
}

impl MultiplexorBox {
    /// Number of target qubits, from the widest branch.
    pub fn n_targets(&self) -> u32 {
        self.branches
            .iter()
            .map(|(_, op)| op.n_qubits())
            .max()
            .unwrap_or(0)
    }
}

/// A multiplexed rotation about a single axis: branch `k` applies the
/// axis rotation with `angles[k]` when the control word equals `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplexedRotationBox {
    /// The rotation axis: `Rx`, `Ry` or `Rz`.
    pub axis: OpType,
    /// One angle per control word; length `2^n_controls`.
    pub angles: Vec<Expr>,
}

impl MultiplexedRotationBox {
    /// Number of control qubits.
    pub fn n_controls(&self) -> u32 {
        debug_assert!(self.angles.len().is_power_of_two());
        self.angles.len().trailing_zeros()
    }
}

/// Multiplexed tensor products of single-qubit operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplexedTensoredU2Box {
    /// Number of control qubits.
    pub n_controls: u32,
    /// `(selector, per-target ops)` branches; each inner op is 1-qubit.
    pub branches: Vec<(u64, Vec<Op>)>,
}

impl MultiplexedTensoredU2Box {
    /// Number of target qubits.
    pub fn n_targets(&self) -> u32 {
        self.branches
            .iter()
            .map(|(_, ops)| ops.len() as u32)
            .max()
            .unwrap_or(0)
    }
}

/// A reusable parametric gate definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGateDef {
    /// Gate name.
    pub name: String,
    /// Formal parameter names, bound positionally at instantiation.
    pub params: Vec<String>,
    /// The defining circuit over default-register qubits.
    pub definition: Circuit,
}

/// An instantiation of a [`CustomGateDef`] with concrete arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The shared definition.
    pub def: Arc<CustomGateDef>,
    /// Positional arguments for the definition's parameters.
    pub args: Vec<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unitary_box_dagger() {
        let m = vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        ];
        let b = UnitaryBox::new(1, m);
        // Y is Hermitian: dagger equals itself.
        assert_eq!(b.dagger_matrix(), b.matrix);
        // But the plain transpose is -Y.
        assert_eq!(b.transpose_matrix()[1], Complex64::new(0.0, 1.0));
    }

    #[test]
    fn test_commuting_set_check() {
        use Pauli::{I, X, Z};
        let good = PauliExpCommutingSetBox {
            gadgets: vec![
                (vec![Z, Z, I], Expr::constant(0.1)),
                (vec![I, Z, Z], Expr::constant(0.2)),
            ],
        };
        assert!(good.is_commuting());

        let bad = PauliExpCommutingSetBox {
            gadgets: vec![
                (vec![Z, I], Expr::constant(0.1)),
                (vec![X, I], Expr::constant(0.2)),
            ],
        };
        assert!(!bad.is_commuting());
    }

    #[test]
    fn test_multiplexed_rotation_controls() {
        let b = MultiplexedRotationBox {
            axis: OpType::Rz,
            angles: vec![Expr::constant(0.0); 8],
        };
        assert_eq!(b.n_controls(), 3);
    }
}
