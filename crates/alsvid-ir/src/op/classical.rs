//! Purely classical operations.
//!
//! Classical ops act on bit wires only. Input-only bits are read through
//! Boolean (fan-out) wires; in/out and output-only bits are written
//! through linear classical wires. Evaluatable ops carry truth tables
//! indexed by the little-endian integer of their inputs.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CircuitError, IrResult};
use crate::op::gate::OpType;
use crate::wire::WireType;

/// A purely classical operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassicalOp {
    /// Set output-only bits to fixed values.
    SetBits {
        /// The values written.
        values: Vec<bool>,
    },
    /// Copy `n` input bits onto `n` output bits.
    CopyBits {
        /// Number of bits copied.
        n: u32,
    },
    /// A predicate over `n` input bits with one fresh output bit.
    ///
    /// `values[k]` is the output for the little-endian input encoding `k`.
    ExplicitPredicate {
        /// Number of input bits.
        n: u32,
        /// Truth table of length `2^n`.
        values: Vec<bool>,
        /// Display name.
        name: String,
    },
    /// A truth-table update of one in/out bit from `n` input bits.
    ///
    /// The modified bit is the last input; `values` has length `2^(n+1)`.
    ExplicitModifier {
        /// Number of input bits besides the modified bit.
        n: u32,
        /// Truth table of length `2^(n+1)`.
        values: Vec<bool>,
        /// Display name.
        name: String,
    },
    /// Outputs 1 iff the little-endian decoded input lies in `[a, b]`.
    RangePredicate {
        /// Number of input bits.
        n: u32,
        /// Inclusive lower bound.
        a: u64,
        /// Inclusive upper bound.
        b: u64,
    },
    /// An operation applied simultaneously to `n` contiguous argument
    /// groups.
    MultiBit {
        /// The tiled operation.
        op: Arc<ClassicalOp>,
        /// Number of tiles.
        n: u32,
    },
    /// A general transform where all `n` bits are both read and written.
    ///
    /// `values[k]` is the little-endian encoded output word for input `k`.
    ClassicalTransform {
        /// Number of in/out bits.
        n: u32,
        /// Table of length `2^n` of binary-encoded outputs.
        values: Vec<u32>,
        /// Display name.
        name: String,
    },
}

impl ClassicalOp {
    /// Number of input-only bits (read through Boolean wires).
    pub fn n_i(&self) -> u32 {
        match self {
            ClassicalOp::SetBits { .. } => 0,
            ClassicalOp::CopyBits { n } => *n,
            ClassicalOp::ExplicitPredicate { n, .. } => *n,
            ClassicalOp::ExplicitModifier { n, .. } => *n,
            ClassicalOp::RangePredicate { n, .. } => *n,
            ClassicalOp::MultiBit { op, n } => op.n_i() * n,
            ClassicalOp::ClassicalTransform { .. } => 0,
        }
    }

    /// Number of in/out bits.
    pub fn n_io(&self) -> u32 {
        match self {
            ClassicalOp::ExplicitModifier { .. } => 1,
            ClassicalOp::ClassicalTransform { n, .. } => *n,
            ClassicalOp::MultiBit { op, n } => op.n_io() * n,
            _ => 0,
        }
    }

    /// Number of output-only bits.
    pub fn n_o(&self) -> u32 {
        match self {
            ClassicalOp::SetBits { values } => values.len() as u32,
            ClassicalOp::CopyBits { n } => *n,
            ClassicalOp::ExplicitPredicate { .. } | ClassicalOp::RangePredicate { .. } => 1,
            ClassicalOp::ExplicitModifier { .. } => 0,
            ClassicalOp::MultiBit { op, n } => op.n_o() * n,
            ClassicalOp::ClassicalTransform { .. } => 0,
        }
    }

    /// Total number of bit arguments.
    pub fn n_bits(&self) -> u32 {
        self.n_i() + self.n_io() + self.n_o()
    }

    /// The operation's tag.
    pub fn optype(&self) -> OpType {
        match self {
            ClassicalOp::SetBits { .. } => OpType::SetBits,
            ClassicalOp::CopyBits { .. } => OpType::CopyBits,
            ClassicalOp::ExplicitPredicate { .. } => OpType::ExplicitPredicate,
            ClassicalOp::ExplicitModifier { .. } => OpType::ExplicitModifier,
            ClassicalOp::RangePredicate { .. } => OpType::RangePredicate,
            ClassicalOp::MultiBit { .. } => OpType::MultiBit,
            ClassicalOp::ClassicalTransform { .. } => OpType::ClassicalTransform,
        }
    }

    /// Wire signature: Boolean reads for input-only bits, classical
    /// writes for in/out and output-only bits.
    pub fn signature(&self) -> Vec<WireType> {
        let mut sig = vec![WireType::Boolean; self.n_i() as usize];
        sig.extend(vec![
            WireType::Classical;
            (self.n_io() + self.n_o()) as usize
        ]);
        sig
    }

    /// Whether this op can be evaluated on concrete bit values.
    ///
    /// All variants here can; the distinction matters for equality, which
    /// is defined by truth-table extensionality.
    pub fn is_eval_op(&self) -> bool {
        true
    }

    /// Evaluate on inputs of length `n_i + n_io`; output has length
    /// `n_io + n_o`.
    pub fn eval(&self, x: &[bool]) -> IrResult<Vec<bool>> {
        let expected = (self.n_i() + self.n_io()) as usize;
        if x.len() != expected {
            return Err(CircuitError::CircuitInvalidity(format!(
                "classical op expected {expected} input bits, got {}",
                x.len()
            )));
        }
        Ok(match self {
            ClassicalOp::SetBits { values } => values.clone(),
            ClassicalOp::CopyBits { .. } => x.to_vec(),
            ClassicalOp::ExplicitPredicate { values, .. }
            | ClassicalOp::ExplicitModifier { values, .. } => {
                vec![values[le_index(x)]]
            }
            ClassicalOp::RangePredicate { a, b, .. } => {
                let v = le_index(x) as u64;
                vec![*a <= v && v <= *b]
            }
            ClassicalOp::MultiBit { op, n } => {
                let in_chunk = (op.n_i() + op.n_io()) as usize;
                let mut out = Vec::new();
                for k in 0..*n as usize {
                    out.extend(op.eval(&x[k * in_chunk..(k + 1) * in_chunk])?);
                }
                out
            }
            ClassicalOp::ClassicalTransform { n, values, .. } => {
                let word = values[le_index(x)];
                (0..*n as usize).map(|j| (word >> j) & 1 == 1).collect()
            }
        })
    }

    /// Truth-table equality: two evaluatable ops of the same shape are
    /// equal iff they produce equal outputs on every input.
    pub fn table_equal(&self, other: &ClassicalOp) -> bool {
        if (self.n_i(), self.n_io(), self.n_o()) != (other.n_i(), other.n_io(), other.n_o()) {
            return false;
        }
        let n_in = (self.n_i() + self.n_io()) as usize;
        if n_in > 20 {
            // Beyond exhaustive range, fall back to structural equality.
            return format!("{self:?}") == format!("{other:?}");
        }
        for k in 0..(1usize << n_in) {
            let x: Vec<bool> = (0..n_in).map(|j| (k >> j) & 1 == 1).collect();
            match (self.eval(&x), other.eval(&x)) {
                (Ok(a), Ok(b)) if a == b => {}
                _ => return false,
            }
        }
        true
    }

    /// Display name.
    pub fn name(&self) -> String {
        match self {
            ClassicalOp::SetBits { .. } => "SetBits".to_string(),
            ClassicalOp::CopyBits { .. } => "CopyBits".to_string(),
            ClassicalOp::ExplicitPredicate { name, .. }
            | ClassicalOp::ExplicitModifier { name, .. }
            | ClassicalOp::ClassicalTransform { name, .. } => name.clone(),
            ClassicalOp::RangePredicate { .. } => "RangePredicate".to_string(),
            ClassicalOp::MultiBit { op, .. } => format!("MultiBit({})", op.name()),
        }
    }
}

/// Truth-table equality (shape plus extensional behaviour).
impl PartialEq for ClassicalOp {
    fn eq(&self, other: &Self) -> bool {
        self.table_equal(other)
    }
}

/// Little-endian decoding of a bit slice.
fn le_index(x: &[bool]) -> usize {
    x.iter()
        .enumerate()
        .fold(0usize, |acc, (i, &b)| acc | (usize::from(b) << i))
}

/// Classical NOT transform (one in/out bit).
pub fn classical_x() -> ClassicalOp {
    ClassicalOp::ClassicalTransform {
        n: 1,
        values: vec![1, 0],
        name: "ClassicalX".to_string(),
    }
}

/// Classical CNOT transform (two in/out bits; second bit flips on first).
pub fn classical_cx() -> ClassicalOp {
    ClassicalOp::ClassicalTransform {
        n: 2,
        values: vec![0, 3, 2, 1],
        name: "ClassicalCX".to_string(),
    }
}

/// Unary NOT predicate.
pub fn not_op() -> ClassicalOp {
    ClassicalOp::ExplicitPredicate {
        n: 1,
        values: vec![true, false],
        name: "NOT".to_string(),
    }
}

/// Binary AND predicate.
pub fn and_op() -> ClassicalOp {
    ClassicalOp::ExplicitPredicate {
        n: 2,
        values: vec![false, false, false, true],
        name: "AND".to_string(),
    }
}

/// Binary OR predicate.
pub fn or_op() -> ClassicalOp {
    ClassicalOp::ExplicitPredicate {
        n: 2,
        values: vec![false, true, true, true],
        name: "OR".to_string(),
    }
}

/// Binary XOR predicate.
pub fn xor_op() -> ClassicalOp {
    ClassicalOp::ExplicitPredicate {
        n: 2,
        values: vec![false, true, true, false],
        name: "XOR".to_string(),
    }
}

/// In-place AND with one input.
pub fn and_with_op() -> ClassicalOp {
    ClassicalOp::ExplicitModifier {
        n: 1,
        values: vec![false, false, false, true],
        name: "AND".to_string(),
    }
}

/// In-place OR with one input.
pub fn or_with_op() -> ClassicalOp {
    ClassicalOp::ExplicitModifier {
        n: 1,
        values: vec![false, true, true, true],
        name: "OR".to_string(),
    }
}

/// In-place XOR with one input.
pub fn xor_with_op() -> ClassicalOp {
    ClassicalOp::ExplicitModifier {
        n: 1,
        values: vec![false, true, true, false],
        name: "XOR".to_string(),
    }
}
