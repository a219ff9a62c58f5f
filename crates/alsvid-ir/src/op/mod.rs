//! The operation hierarchy.
//!
//! Every vertex in a circuit carries an [`Op`]: a tagged value with a
//! fixed wire signature and uniform capabilities (dagger, transpose,
//! symbol substitution, structural equality, hashing). Large payloads
//! (nested circuits, matrices, branch tables) live behind `Arc`s so ops
//! clone cheaply and may be shared between vertices.

pub mod boxes;
pub mod classical;
pub mod gate;
pub mod wasm;

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use alsvid_types::{Expr, Pauli};

use crate::error::{CircuitError, IrResult};
use crate::wire::WireType;

pub use boxes::{
    CircBox, CustomGate, CustomGateDef, ExpBox, MultiplexedRotationBox, MultiplexedTensoredU2Box,
    MultiplexorBox, PauliExpBox, PauliExpCommutingSetBox, PauliExpPairBox, QControlBox, UnitaryBox,
};
pub use classical::ClassicalOp;
pub use gate::OpType;
pub use wasm::WasmOp;

/// A classically controlled wrapper around an inner operation.
///
/// The wrapper prepends `width` Boolean inputs; the inner op runs iff
/// the little-endian integer they encode equals `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    /// The guarded operation.
    pub op: Op,
    /// Number of condition bits.
    pub width: u32,
    /// The value the condition bits must encode.
    pub value: u64,
}

/// A circuit operation.
///
/// Serialization uses the tagged `{"type": …}` shape implemented in
/// [`crate::json`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Quantum input boundary sentinel.
    Input,
    /// Quantum output boundary sentinel.
    Output,
    /// Classical input boundary sentinel.
    ClInput,
    /// Classical output boundary sentinel.
    ClOutput,
    /// WASM-state input boundary sentinel.
    WasmInput,
    /// WASM-state output boundary sentinel.
    WasmOutput,
    /// A primitive gate with its parameter list.
    Gate {
        /// The gate tag; must satisfy [`OpType::is_gate`].
        gate: OpType,
        /// Ordered parameters.
        params: Vec<Expr>,
    },
    /// A synchronisation barrier.
    Barrier {
        /// Wire types the barrier spans.
        signature: Vec<WireType>,
        /// Free-form payload, preserved by all transforms.
        data: String,
    },
    /// A classically controlled operation.
    Conditional(Arc<Conditional>),
    /// A nested circuit.
    CircBox(Arc<CircBox>),
    /// An arbitrary 2×2 unitary.
    Unitary1qBox(Arc<UnitaryBox>),
    /// An arbitrary 4×4 unitary.
    Unitary2qBox(Arc<UnitaryBox>),
    /// An arbitrary 8×8 unitary.
    Unitary3qBox(Arc<UnitaryBox>),
    /// exp(i·A·t) for Hermitian A.
    ExpBox(Arc<ExpBox>),
    /// A single Pauli exponential.
    PauliExpBox(Arc<PauliExpBox>),
    /// A pair of Pauli exponentials.
    PauliExpPairBox(Arc<PauliExpPairBox>),
    /// A commuting set of Pauli exponentials.
    PauliExpCommutingSetBox(Arc<PauliExpCommutingSetBox>),
    /// An n-controlled operation.
    QControlBox(Arc<QControlBox>),
    /// Select-controlled operations.
    MultiplexorBox(Arc<MultiplexorBox>),
    /// Multiplexed single-axis rotations.
    MultiplexedRotationBox(Arc<MultiplexedRotationBox>),
    /// Multiplexed single-qubit unitaries.
    MultiplexedU2Box(Arc<MultiplexorBox>),
    /// Multiplexed tensor products of single-qubit unitaries.
    MultiplexedTensoredU2Box(Arc<MultiplexedTensoredU2Box>),
    /// Instantiation of a user-defined gate.
    CustomGate(Arc<CustomGate>),
    /// A purely classical operation.
    Classical(ClassicalOp),
    /// An opaque external WASM call.
    Wasm(Arc<WasmOp>),
}

impl Op {
    /// Construct a primitive gate, validating the parameter count.
    pub fn gate(gate: OpType, params: Vec<Expr>) -> IrResult<Self> {
        let Some((_, _, n_params)) = gate.gate_arity() else {
            return Err(CircuitError::CircuitInvalidity(format!(
                "{gate:?} is not a primitive gate"
            )));
        };
        if params.len() != n_params as usize {
            return Err(CircuitError::InvalidArguments {
                op: gate,
                expected: n_params as usize,
                got: params.len(),
            });
        }
        Ok(Op::Gate { gate, params })
    }

    /// A parameterless primitive gate.
    ///
    /// # Panics
    ///
    /// Panics if `gate` takes parameters or is not a gate tag.
    pub fn simple_gate(gate: OpType) -> Self {
        Op::gate(gate, vec![]).expect("simple_gate requires a parameterless gate tag")
    }

    /// Wrap an op in a condition.
    pub fn conditional(op: Op, width: u32, value: u64) -> IrResult<Self> {
        if width < 64 && value >= (1u64 << width) {
            return Err(CircuitError::ConditionValueOutOfRange { value, width });
        }
        Ok(Op::Conditional(Arc::new(Conditional { op, width, value })))
    }

    /// The operation's tag.
    pub fn optype(&self) -> OpType {
        match self {
            Op::Input => OpType::Input,
            Op::Output => OpType::Output,
            Op::ClInput => OpType::ClInput,
            Op::ClOutput => OpType::ClOutput,
            Op::WasmInput => OpType::WasmInput,
            Op::WasmOutput => OpType::WasmOutput,
            Op::Gate { gate, .. } => *gate,
            Op::Barrier { .. } => OpType::Barrier,
            Op::Conditional(_) => OpType::Conditional,
            Op::CircBox(_) => OpType::CircBox,
            Op::Unitary1qBox(_) => OpType::Unitary1qBox,
            Op::Unitary2qBox(_) => OpType::Unitary2qBox,
            Op::Unitary3qBox(_) => OpType::Unitary3qBox,
            Op::ExpBox(_) => OpType::ExpBox,
            Op::PauliExpBox(_) => OpType::PauliExpBox,
            Op::PauliExpPairBox(_) => OpType::PauliExpPairBox,
            Op::PauliExpCommutingSetBox(_) => OpType::PauliExpCommutingSetBox,
            Op::QControlBox(_) => OpType::QControlBox,
            Op::MultiplexorBox(_) => OpType::MultiplexorBox,
            Op::MultiplexedRotationBox(_) => OpType::MultiplexedRotationBox,
            Op::MultiplexedU2Box(_) => OpType::MultiplexedU2Box,
            Op::MultiplexedTensoredU2Box(_) => OpType::MultiplexedTensoredU2Box,
            Op::CustomGate(_) => OpType::CustomGate,
            Op::Classical(c) => c.optype(),
            Op::Wasm(_) => OpType::WasmOp,
        }
    }

    /// The ordered wire-type signature determining port layout.
    pub fn signature(&self) -> Vec<WireType> {
        match self {
            Op::Input | Op::Output => vec![WireType::Quantum],
            Op::ClInput | Op::ClOutput => vec![WireType::Classical],
            Op::WasmInput | Op::WasmOutput => vec![WireType::Wasm],
            Op::Gate { gate, .. } => {
                let (nq, nb, _) = gate.gate_arity().expect("gate variant holds a gate tag");
                let mut sig = vec![WireType::Quantum; nq as usize];
                sig.extend(vec![WireType::Classical; nb as usize]);
                sig
            }
            Op::Barrier { signature, .. } => signature.clone(),
            Op::Conditional(c) => {
                let mut sig = vec![WireType::Boolean; c.width as usize];
                sig.extend(c.op.signature());
                sig
            }
            Op::CircBox(b) => {
                let mut sig = vec![WireType::Quantum; b.circuit.n_qubits()];
                sig.extend(vec![WireType::Classical; b.circuit.n_bits()]);
                sig
            }
            Op::Unitary1qBox(_) => vec![WireType::Quantum],
            Op::Unitary2qBox(_) => vec![WireType::Quantum; 2],
            Op::Unitary3qBox(_) => vec![WireType::Quantum; 3],
            Op::ExpBox(b) => vec![WireType::Quantum; b.n_qubits as usize],
            Op::PauliExpBox(b) => vec![WireType::Quantum; b.paulis.len()],
            Op::PauliExpPairBox(b) => {
                vec![WireType::Quantum; b.paulis0.len().max(b.paulis1.len())]
            }
            Op::PauliExpCommutingSetBox(b) => {
                let n = b.gadgets.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
                vec![WireType::Quantum; n]
            }
            Op::QControlBox(b) => {
                let mut sig = vec![WireType::Quantum; b.n_controls as usize];
                sig.extend(b.op.signature());
                sig
            }
            Op::MultiplexorBox(b) | Op::MultiplexedU2Box(b) => {
                vec![WireType::Quantum; (b.n_controls + b.n_targets()) as usize]
            }
            Op::MultiplexedRotationBox(b) => {
                vec![WireType::Quantum; b.n_controls() as usize + 1]
            }
            Op::MultiplexedTensoredU2Box(b) => {
                vec![WireType::Quantum; (b.n_controls + b.n_targets()) as usize]
            }
            Op::CustomGate(g) => vec![WireType::Quantum; g.def.definition.n_qubits()],
            Op::Classical(c) => c.signature(),
            Op::Wasm(w) => w.signature(),
        }
    }

    /// Number of quantum wires.
    pub fn n_qubits(&self) -> u32 {
        self.signature()
            .iter()
            .filter(|t| **t == WireType::Quantum)
            .count() as u32
    }

    /// Number of linear classical wires.
    pub fn n_classical(&self) -> u32 {
        self.signature()
            .iter()
            .filter(|t| **t == WireType::Classical)
            .count() as u32
    }

    /// Number of Boolean read wires.
    pub fn n_boolean(&self) -> u32 {
        self.signature()
            .iter()
            .filter(|t| **t == WireType::Boolean)
            .count() as u32
    }

    /// Number of bit arguments of any kind.
    pub fn n_bits(&self) -> u32 {
        self.n_classical() + self.n_boolean()
    }

    /// True for boundary sentinels.
    pub fn is_boundary(&self) -> bool {
        self.optype().is_boundary()
    }

    /// True for Clifford-group primitive gates.
    pub fn is_clifford(&self) -> bool {
        self.optype().is_clifford_gate()
    }

    /// True for opaque external operations.
    pub fn is_extern(&self) -> bool {
        matches!(self, Op::Wasm(_))
    }

    /// All free symbols in parameters, recursively through wrappers.
    pub fn free_symbols(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        match self {
            Op::Gate { params, .. } => {
                for p in params {
                    set.extend(p.free_symbols());
                }
            }
            Op::Conditional(c) => set = c.op.free_symbols(),
            Op::CircBox(b) => set = b.circuit.free_symbols(),
            Op::PauliExpBox(b) => set = b.t.free_symbols(),
            Op::PauliExpPairBox(b) => {
                set.extend(b.t0.free_symbols());
                set.extend(b.t1.free_symbols());
            }
            Op::PauliExpCommutingSetBox(b) => {
                for (_, t) in &b.gadgets {
                    set.extend(t.free_symbols());
                }
            }
            Op::QControlBox(b) => set = b.op.free_symbols(),
            Op::MultiplexorBox(b) | Op::MultiplexedU2Box(b) => {
                for (_, op) in &b.branches {
                    set.extend(op.free_symbols());
                }
            }
            Op::MultiplexedRotationBox(b) => {
                for a in &b.angles {
                    set.extend(a.free_symbols());
                }
            }
            Op::MultiplexedTensoredU2Box(b) => {
                for (_, ops) in &b.branches {
                    for op in ops {
                        set.extend(op.free_symbols());
                    }
                }
            }
            Op::CustomGate(g) => {
                for a in &g.args {
                    set.extend(a.free_symbols());
                }
            }
            _ => {}
        }
        set
    }

    /// Replace free symbols throughout the operation.
    ///
    /// Numeric operations return themselves unchanged.
    pub fn symbol_substitution(&self, map: &FxHashMap<String, Expr>) -> Op {
        match self {
            Op::Gate { gate, params } => Op::Gate {
                gate: *gate,
                params: params.iter().map(|p| p.substitute(map)).collect(),
            },
            Op::Conditional(c) => Op::Conditional(Arc::new(Conditional {
                op: c.op.symbol_substitution(map),
                width: c.width,
                value: c.value,
            })),
            Op::CircBox(b) => {
                let mut circuit = b.circuit.clone();
                circuit.symbol_substitution(map);
                Op::CircBox(Arc::new(CircBox { circuit }))
            }
            Op::PauliExpBox(b) => Op::PauliExpBox(Arc::new(PauliExpBox {
                paulis: b.paulis.clone(),
                t: b.t.substitute(map),
            })),
            Op::PauliExpPairBox(b) => Op::PauliExpPairBox(Arc::new(PauliExpPairBox {
                paulis0: b.paulis0.clone(),
                t0: b.t0.substitute(map),
                paulis1: b.paulis1.clone(),
                t1: b.t1.substitute(map),
            })),
            Op::PauliExpCommutingSetBox(b) => {
                Op::PauliExpCommutingSetBox(Arc::new(PauliExpCommutingSetBox {
                    gadgets: b
                        .gadgets
                        .iter()
                        .map(|(p, t)| (p.clone(), t.substitute(map)))
                        .collect(),
                }))
            }
            Op::QControlBox(b) => Op::QControlBox(Arc::new(QControlBox {
                op: b.op.symbol_substitution(map),
                n_controls: b.n_controls,
            })),
            Op::MultiplexorBox(b) => Op::MultiplexorBox(Arc::new(substitute_multiplexor(b, map))),
            Op::MultiplexedU2Box(b) => {
                Op::MultiplexedU2Box(Arc::new(substitute_multiplexor(b, map)))
            }
            Op::MultiplexedRotationBox(b) => {
                Op::MultiplexedRotationBox(Arc::new(MultiplexedRotationBox {
                    axis: b.axis,
                    angles: b.angles.iter().map(|a| a.substitute(map)).collect(),
                }))
            }
            Op::MultiplexedTensoredU2Box(b) => {
                Op::MultiplexedTensoredU2Box(Arc::new(MultiplexedTensoredU2Box {
                    n_controls: b.n_controls,
                    branches: b
                        .branches
                        .iter()
                        .map(|(sel, ops)| {
                            (*sel, ops.iter().map(|o| o.symbol_substitution(map)).collect())
                        })
                        .collect(),
                }))
            }
            Op::CustomGate(g) => Op::CustomGate(Arc::new(CustomGate {
                def: g.def.clone(),
                args: g.args.iter().map(|a| a.substitute(map)).collect(),
            })),
            _ => self.clone(),
        }
    }

    /// The adjoint operation. Daggers are involutive.
    pub fn dagger(&self) -> IrResult<Op> {
        use OpType::{
            CCX, CH, CRz, CX, CY, CZ, H, Noop, Phase, Rx, Ry, Rz, S, Sdg, Swap, T, Tdg, U1, U3, V,
            Vdg, X, Y, Z,
        };
        Ok(match self {
            Op::Gate { gate, params } => match gate {
                X | Y | Z | H | CX | CY | CZ | CH | Swap | CCX | Noop => self.clone(),
                S => Op::simple_gate(Sdg),
                Sdg => Op::simple_gate(S),
                T => Op::simple_gate(Tdg),
                Tdg => Op::simple_gate(T),
                V => Op::simple_gate(Vdg),
                Vdg => Op::simple_gate(V),
                Rx | Ry | Rz | U1 | CRz | Phase => Op::Gate {
                    gate: *gate,
                    params: vec![(-params[0].clone()).simplify()],
                },
                U3 => Op::Gate {
                    gate: U3,
                    params: vec![
                        (-params[0].clone()).simplify(),
                        (-params[2].clone()).simplify(),
                        (-params[1].clone()).simplify(),
                    ],
                },
                _ => {
                    return Err(CircuitError::CircuitInvalidity(format!(
                        "dagger is not defined for {gate:?}"
                    )));
                }
            },
            Op::Barrier { .. } => self.clone(),
            Op::Conditional(c) => Op::Conditional(Arc::new(Conditional {
                op: c.op.dagger()?,
                width: c.width,
                value: c.value,
            })),
            Op::CircBox(b) => Op::CircBox(Arc::new(CircBox {
                circuit: b.circuit.dagger()?,
            })),
            Op::Unitary1qBox(b) => Op::Unitary1qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.dagger_matrix(),
            ))),
            Op::Unitary2qBox(b) => Op::Unitary2qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.dagger_matrix(),
            ))),
            Op::Unitary3qBox(b) => Op::Unitary3qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.dagger_matrix(),
            ))),
            Op::ExpBox(b) => Op::ExpBox(Arc::new(ExpBox {
                n_qubits: b.n_qubits,
                hermitian: b.hermitian.clone(),
                t: -b.t,
            })),
            Op::PauliExpBox(b) => Op::PauliExpBox(Arc::new(PauliExpBox {
                paulis: b.paulis.clone(),
                t: (-b.t.clone()).simplify(),
            })),
            Op::PauliExpPairBox(b) => Op::PauliExpPairBox(Arc::new(PauliExpPairBox {
                paulis0: b.paulis1.clone(),
                t0: (-b.t1.clone()).simplify(),
                paulis1: b.paulis0.clone(),
                t1: (-b.t0.clone()).simplify(),
            })),
            Op::PauliExpCommutingSetBox(b) => {
                Op::PauliExpCommutingSetBox(Arc::new(PauliExpCommutingSetBox {
                    gadgets: b
                        .gadgets
                        .iter()
                        .map(|(p, t)| (p.clone(), (-t.clone()).simplify()))
                        .collect(),
                }))
            }
            Op::QControlBox(b) => Op::QControlBox(Arc::new(QControlBox {
                op: b.op.dagger()?,
                n_controls: b.n_controls,
            })),
            Op::MultiplexorBox(b) => Op::MultiplexorBox(Arc::new(dagger_multiplexor(b)?)),
            Op::MultiplexedU2Box(b) => Op::MultiplexedU2Box(Arc::new(dagger_multiplexor(b)?)),
            Op::MultiplexedRotationBox(b) => {
                Op::MultiplexedRotationBox(Arc::new(MultiplexedRotationBox {
                    axis: b.axis,
                    angles: b
                        .angles
                        .iter()
                        .map(|a| (-a.clone()).simplify())
                        .collect(),
                }))
            }
            Op::MultiplexedTensoredU2Box(b) => {
                let mut branches = Vec::with_capacity(b.branches.len());
                for (sel, ops) in &b.branches {
                    let ops = ops.iter().map(Op::dagger).collect::<IrResult<Vec<_>>>()?;
                    branches.push((*sel, ops));
                }
                Op::MultiplexedTensoredU2Box(Arc::new(MultiplexedTensoredU2Box {
                    n_controls: b.n_controls,
                    branches,
                }))
            }
            Op::CustomGate(g) => {
                let mut map = FxHashMap::default();
                for (name, arg) in g.def.params.iter().zip(&g.args) {
                    map.insert(name.clone(), arg.clone());
                }
                let mut circuit = g.def.definition.clone();
                circuit.symbol_substitution(&map);
                Op::CircBox(Arc::new(CircBox {
                    circuit: circuit.dagger()?,
                }))
            }
            _ => {
                return Err(CircuitError::CircuitInvalidity(format!(
                    "dagger is not defined for {:?}",
                    self.optype()
                )));
            }
        })
    }

    /// The transposed operation.
    ///
    /// `Y` transposes to itself up to a global phase of −1, which
    /// [`Circuit::transpose`](crate::circuit::Circuit::transpose)
    /// accounts for.
    pub fn transpose(&self) -> IrResult<Op> {
        use OpType::{
            CCX, CH, CRz, CX, CZ, H, Noop, Phase, Rx, Ry, Rz, S, Sdg, Swap, T, Tdg, U1, U3, V, Vdg,
            X, Y, Z,
        };
        Ok(match self {
            Op::Gate { gate, params } => match gate {
                X | Y | Z | H | S | Sdg | T | Tdg | V | Vdg | CX | CZ | CH | Swap | CCX | Noop => {
                    self.clone()
                }
                Rx | Rz | U1 | CRz | Phase => self.clone(),
                Ry => Op::Gate {
                    gate: Ry,
                    params: vec![(-params[0].clone()).simplify()],
                },
                U3 => Op::Gate {
                    gate: U3,
                    params: vec![
                        (-params[0].clone()).simplify(),
                        params[2].clone(),
                        params[1].clone(),
                    ],
                },
                _ => {
                    return Err(CircuitError::CircuitInvalidity(format!(
                        "transpose is not defined for {gate:?}"
                    )));
                }
            },
            Op::Barrier { .. } => self.clone(),
            Op::Conditional(c) => Op::Conditional(Arc::new(Conditional {
                op: c.op.transpose()?,
                width: c.width,
                value: c.value,
            })),
            Op::CircBox(b) => Op::CircBox(Arc::new(CircBox {
                circuit: b.circuit.transpose()?,
            })),
            Op::Unitary1qBox(b) => Op::Unitary1qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.transpose_matrix(),
            ))),
            Op::Unitary2qBox(b) => Op::Unitary2qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.transpose_matrix(),
            ))),
            Op::Unitary3qBox(b) => Op::Unitary3qBox(Arc::new(UnitaryBox::new(
                b.n_qubits,
                b.transpose_matrix(),
            ))),
            Op::ExpBox(b) => {
                let transposed = UnitaryBox::new(b.n_qubits, b.hermitian.clone());
                Op::ExpBox(Arc::new(ExpBox {
                    n_qubits: b.n_qubits,
                    hermitian: transposed.transpose_matrix(),
                    t: b.t,
                }))
            }
            // Transpose negates the angle iff the Y-count is odd.
            Op::PauliExpBox(b) => {
                let t = if b.n_ys() % 2 == 1 {
                    (-b.t.clone()).simplify()
                } else {
                    b.t.clone()
                };
                Op::PauliExpBox(Arc::new(PauliExpBox {
                    paulis: b.paulis.clone(),
                    t,
                }))
            }
            Op::PauliExpPairBox(b) => {
                let flip = |paulis: &[Pauli], t: &Expr| {
                    if paulis.iter().filter(|p| **p == Pauli::Y).count() % 2 == 1 {
                        (-t.clone()).simplify()
                    } else {
                        t.clone()
                    }
                };
                Op::PauliExpPairBox(Arc::new(PauliExpPairBox {
                    paulis0: b.paulis1.clone(),
                    t0: flip(&b.paulis1, &b.t1),
                    paulis1: b.paulis0.clone(),
                    t1: flip(&b.paulis0, &b.t0),
                }))
            }
            Op::PauliExpCommutingSetBox(b) => {
                Op::PauliExpCommutingSetBox(Arc::new(PauliExpCommutingSetBox {
                    gadgets: b
                        .gadgets
                        .iter()
                        .map(|(p, t)| {
                            let t = if p.iter().filter(|q| **q == Pauli::Y).count() % 2 == 1 {
                                (-t.clone()).simplify()
                            } else {
                                t.clone()
                            };
                            (p.clone(), t)
                        })
                        .collect(),
                }))
            }
            Op::QControlBox(b) => Op::QControlBox(Arc::new(QControlBox {
                op: b.op.transpose()?,
                n_controls: b.n_controls,
            })),
            Op::MultiplexorBox(b) => Op::MultiplexorBox(Arc::new(transpose_multiplexor(b)?)),
            Op::MultiplexedU2Box(b) => Op::MultiplexedU2Box(Arc::new(transpose_multiplexor(b)?)),
            Op::MultiplexedRotationBox(b) => {
                let angles = if b.axis == Ry {
                    b.angles.iter().map(|a| (-a.clone()).simplify()).collect()
                } else {
                    b.angles.clone()
                };
                Op::MultiplexedRotationBox(Arc::new(MultiplexedRotationBox {
                    axis: b.axis,
                    angles,
                }))
            }
            Op::MultiplexedTensoredU2Box(b) => {
                let mut branches = Vec::with_capacity(b.branches.len());
                for (sel, ops) in &b.branches {
                    let ops = ops
                        .iter()
                        .map(Op::transpose)
                        .collect::<IrResult<Vec<_>>>()?;
                    branches.push((*sel, ops));
                }
                Op::MultiplexedTensoredU2Box(Arc::new(MultiplexedTensoredU2Box {
                    n_controls: b.n_controls,
                    branches,
                }))
            }
            Op::CustomGate(g) => {
                let mut map = FxHashMap::default();
                for (name, arg) in g.def.params.iter().zip(&g.args) {
                    map.insert(name.clone(), arg.clone());
                }
                let mut circuit = g.def.definition.clone();
                circuit.symbol_substitution(&map);
                Op::CircBox(Arc::new(CircBox {
                    circuit: circuit.transpose()?,
                }))
            }
            _ => {
                return Err(CircuitError::CircuitInvalidity(format!(
                    "transpose is not defined for {:?}",
                    self.optype()
                )));
            }
        })
    }

    /// Whether conjugating the given Pauli on the given port yields the
    /// same Pauli on that port (the op "commutes with the basis" there).
    ///
    /// Used by Clifford rewrites to hoist segments past CX gates.
    pub fn commutes_with_basis(&self, basis: Pauli, port: usize) -> bool {
        use OpType::{CRz, CX, CZ, Measure, Noop, Phase, Rx, Ry, Rz, S, Sdg, T, Tdg, U1, V, Vdg, X, Y, Z};
        match self {
            Op::Gate { gate, .. } => match basis {
                Pauli::I => true,
                Pauli::Z => match gate {
                    Z | S | Sdg | T | Tdg | Rz | U1 | Phase | Noop => true,
                    CZ | CRz => true,
                    CX => port == 0,
                    Measure => port == 0,
                    _ => false,
                },
                Pauli::X => match gate {
                    X | V | Vdg | Rx | Noop => true,
                    CX => port == 1,
                    _ => false,
                },
                Pauli::Y => matches!(gate, Y | Ry | Noop),
            },
            _ => false,
        }
    }

    /// A stable hash of the operation, consistent with equality for all
    /// variants except classical eval ops (which compare by truth table
    /// and hash only by shape).
    pub fn hash_value(&self) -> u64 {
        let mut h = FxHasher::default();
        self.optype().hash(&mut h);
        match self {
            Op::Gate { params, .. } => {
                for p in params {
                    p.hash(&mut h);
                }
            }
            Op::Barrier { signature, data } => {
                signature.hash(&mut h);
                data.hash(&mut h);
            }
            Op::Conditional(c) => {
                c.width.hash(&mut h);
                c.value.hash(&mut h);
                c.op.hash_value().hash(&mut h);
            }
            Op::CircBox(b) => {
                b.circuit.n_qubits().hash(&mut h);
                b.circuit.n_bits().hash(&mut h);
                b.circuit.n_vertices().hash(&mut h);
            }
            Op::Unitary1qBox(b) | Op::Unitary2qBox(b) | Op::Unitary3qBox(b) => {
                for c in &b.matrix {
                    c.re.to_bits().hash(&mut h);
                    c.im.to_bits().hash(&mut h);
                }
            }
            Op::ExpBox(b) => {
                b.t.to_bits().hash(&mut h);
                for c in &b.hermitian {
                    c.re.to_bits().hash(&mut h);
                    c.im.to_bits().hash(&mut h);
                }
            }
            Op::PauliExpBox(b) => {
                b.paulis.hash(&mut h);
                b.t.hash(&mut h);
            }
            Op::PauliExpPairBox(b) => {
                b.paulis0.hash(&mut h);
                b.t0.hash(&mut h);
                b.paulis1.hash(&mut h);
                b.t1.hash(&mut h);
            }
            Op::PauliExpCommutingSetBox(b) => {
                for (p, t) in &b.gadgets {
                    p.hash(&mut h);
                    t.hash(&mut h);
                }
            }
            Op::QControlBox(b) => {
                b.n_controls.hash(&mut h);
                b.op.hash_value().hash(&mut h);
            }
            Op::MultiplexorBox(b) | Op::MultiplexedU2Box(b) => {
                b.n_controls.hash(&mut h);
                for (sel, op) in &b.branches {
                    sel.hash(&mut h);
                    op.hash_value().hash(&mut h);
                }
            }
            Op::MultiplexedRotationBox(b) => {
                b.axis.hash(&mut h);
                for a in &b.angles {
                    a.hash(&mut h);
                }
            }
            Op::MultiplexedTensoredU2Box(b) => {
                b.n_controls.hash(&mut h);
                for (sel, ops) in &b.branches {
                    sel.hash(&mut h);
                    for op in ops {
                        op.hash_value().hash(&mut h);
                    }
                }
            }
            Op::CustomGate(g) => {
                g.def.name.hash(&mut h);
                for a in &g.args {
                    a.hash(&mut h);
                }
            }
            Op::Classical(c) => {
                (c.n_i(), c.n_io(), c.n_o()).hash(&mut h);
            }
            Op::Wasm(w) => {
                w.func_name.hash(&mut h);
                w.module_id.hash(&mut h);
                w.n.hash(&mut h);
            }
            _ => {}
        }
        h.finish()
    }
}

fn substitute_multiplexor(b: &MultiplexorBox, map: &FxHashMap<String, Expr>) -> MultiplexorBox {
    MultiplexorBox {
        n_controls: b.n_controls,
        branches: b
            .branches
            .iter()
            .map(|(sel, op)| (*sel, op.symbol_substitution(map)))
            .collect(),
    }
}

fn dagger_multiplexor(b: &MultiplexorBox) -> IrResult<MultiplexorBox> {
    let mut branches = Vec::with_capacity(b.branches.len());
    for (sel, op) in &b.branches {
        branches.push((*sel, op.dagger()?));
    }
    Ok(MultiplexorBox {
        n_controls: b.n_controls,
        branches,
    })
}

fn transpose_multiplexor(b: &MultiplexorBox) -> IrResult<MultiplexorBox> {
    let mut branches = Vec::with_capacity(b.branches.len());
    for (sel, op) in &b.branches {
        branches.push((*sel, op.transpose()?));
    }
    Ok(MultiplexorBox {
        n_controls: b.n_controls,
        branches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_constructor_validates_params() {
        assert!(Op::gate(OpType::H, vec![]).is_ok());
        assert!(Op::gate(OpType::Rz, vec![Expr::constant(0.5)]).is_ok());
        assert!(Op::gate(OpType::Rz, vec![]).is_err());
        assert!(Op::gate(OpType::Barrier, vec![]).is_err());
    }

    #[test]
    fn test_dagger_involutive() {
        let ops = [
            Op::simple_gate(OpType::H),
            Op::simple_gate(OpType::S),
            Op::gate(OpType::Rz, vec![Expr::constant(0.7)]).unwrap(),
            Op::gate(
                OpType::U3,
                vec![
                    Expr::constant(0.1),
                    Expr::constant(0.2),
                    Expr::constant(0.3),
                ],
            )
            .unwrap(),
        ];
        for op in ops {
            assert_eq!(op.dagger().unwrap().dagger().unwrap(), op);
        }
    }

    #[test]
    fn test_s_dagger_is_sdg() {
        assert_eq!(
            Op::simple_gate(OpType::S).dagger().unwrap(),
            Op::simple_gate(OpType::Sdg)
        );
    }

    #[test]
    fn test_conditional_signature() {
        let cond = Op::conditional(Op::simple_gate(OpType::X), 2, 3).unwrap();
        assert_eq!(
            cond.signature(),
            vec![WireType::Boolean, WireType::Boolean, WireType::Quantum]
        );
        assert_eq!(cond.n_qubits(), 1);
        assert_eq!(cond.n_boolean(), 2);
    }

    #[test]
    fn test_conditional_value_range() {
        assert!(Op::conditional(Op::simple_gate(OpType::X), 2, 4).is_err());
        assert!(Op::conditional(Op::simple_gate(OpType::X), 2, 3).is_ok());
    }

    #[test]
    fn test_pauli_exp_transpose_y_parity() {
        use Pauli::{X, Y};
        let odd = Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![Y, X], 0.5)));
        let Op::PauliExpBox(b) = odd.transpose().unwrap() else {
            panic!("expected PauliExpBox");
        };
        assert_eq!(b.t.eval(), Some(-0.5));

        let even = Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![Y, Y], 0.5)));
        let Op::PauliExpBox(b) = even.transpose().unwrap() else {
            panic!("expected PauliExpBox");
        };
        assert_eq!(b.t.eval(), Some(0.5));
    }

    #[test]
    fn test_symbol_substitution_on_gate() {
        let op = Op::gate(OpType::Rx, vec![Expr::symbol("a")]).unwrap();
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), Expr::constant(1.0));
        let sub = op.symbol_substitution(&map);
        assert!(sub.free_symbols().is_empty());
    }

    #[test]
    fn test_classical_ops_compare_by_table() {
        let a = Op::Classical(classical::and_op());
        let b = Op::Classical(ClassicalOp::RangePredicate { n: 2, a: 3, b: 3 });
        assert_eq!(a, b);
    }

    #[test]
    fn test_commutes_with_basis() {
        let cx = Op::simple_gate(OpType::CX);
        assert!(cx.commutes_with_basis(Pauli::Z, 0));
        assert!(!cx.commutes_with_basis(Pauli::Z, 1));
        assert!(cx.commutes_with_basis(Pauli::X, 1));
        let rz = Op::gate(OpType::Rz, vec![Expr::constant(0.3)]).unwrap();
        assert!(rz.commutes_with_basis(Pauli::Z, 0));
        assert!(!rz.commutes_with_basis(Pauli::X, 0));
    }
}
