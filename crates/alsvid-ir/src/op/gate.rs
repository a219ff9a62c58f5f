//! Operation type tags and primitive-gate metadata.

use serde::{Deserialize, Serialize};

/// Tag identifying every operation variant.
///
/// Primitive gates, boundary sentinels, boxes and classical operations
/// all share this flat tag space; it is the key used for gate counting,
/// depth-by-type queries and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    // Boundary sentinels
    /// Quantum input boundary.
    Input,
    /// Quantum output boundary.
    Output,
    /// Classical input boundary.
    ClInput,
    /// Classical output boundary.
    ClOutput,
    /// WASM-state input boundary.
    WasmInput,
    /// WASM-state output boundary.
    WasmOutput,

    // Zero-qubit gates
    /// Global phase, one parameter, no wires.
    Phase,

    // One-qubit gates
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// S (√Z).
    S,
    /// S†.
    Sdg,
    /// T (⁴√Z).
    T,
    /// T†.
    Tdg,
    /// V (√X).
    V,
    /// V†.
    Vdg,
    /// Rotation about X.
    Rx,
    /// Rotation about Y.
    Ry,
    /// Rotation about Z.
    Rz,
    /// Diagonal phase gate.
    U1,
    /// General single-qubit unitary U(θ, φ, λ).
    U3,

    // Two-qubit gates
    /// Controlled-X.
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Controlled-Hadamard.
    CH,
    /// Controlled-Rz.
    CRz,
    /// SWAP.
    Swap,

    // Three-qubit gates
    /// Toffoli.
    CCX,

    // Non-unitary primitives
    /// Z-basis measurement onto a classical bit.
    Measure,
    /// Reset to |0⟩.
    Reset,
    /// Identity placeholder.
    Noop,

    // Structural operations
    /// Synchronisation barrier with free-form data.
    Barrier,
    /// Classically controlled wrapper.
    Conditional,
    /// A nested circuit.
    CircBox,
    /// Arbitrary 2×2 unitary.
    Unitary1qBox,
    /// Arbitrary 4×4 unitary.
    Unitary2qBox,
    /// Arbitrary 8×8 unitary.
    Unitary3qBox,
    /// exp(i·A·t) for Hermitian A.
    ExpBox,
    /// A single Pauli exponential.
    PauliExpBox,
    /// A pair of Pauli exponentials.
    PauliExpPairBox,
    /// A commuting set of Pauli exponentials.
    PauliExpCommutingSetBox,
    /// n-controlled wrapper around an operation.
    QControlBox,
    /// Multiplexed (select-controlled) operations.
    MultiplexorBox,
    /// Multiplexed single-axis rotation.
    MultiplexedRotationBox,
    /// Multiplexed single-qubit unitaries.
    MultiplexedU2Box,
    /// Multiplexed tensor products of single-qubit unitaries.
    MultiplexedTensoredU2Box,
    /// Instantiation of a user-defined parametric gate.
    CustomGate,

    // Classical operations
    /// Set bits to fixed values.
    SetBits,
    /// Copy bits.
    CopyBits,
    /// Truth-table predicate with one fresh output.
    ExplicitPredicate,
    /// Truth-table modifier of one in/out bit.
    ExplicitModifier,
    /// Range membership predicate.
    RangePredicate,
    /// An operation tiled over contiguous argument groups.
    MultiBit,
    /// A general in-place classical transform.
    ClassicalTransform,
    /// Opaque external WASM function call.
    WasmOp,
}

impl OpType {
    /// True for boundary sentinel tags.
    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            OpType::Input
                | OpType::Output
                | OpType::ClInput
                | OpType::ClOutput
                | OpType::WasmInput
                | OpType::WasmOutput
        )
    }

    /// True for an initial boundary sentinel.
    pub fn is_initial(self) -> bool {
        matches!(self, OpType::Input | OpType::ClInput | OpType::WasmInput)
    }

    /// True for a final boundary sentinel.
    pub fn is_final(self) -> bool {
        matches!(self, OpType::Output | OpType::ClOutput | OpType::WasmOutput)
    }

    /// True for primitive gate tags (the variants constructible through
    /// [`Op::gate`](crate::op::Op::gate)).
    pub fn is_gate(self) -> bool {
        self.gate_arity().is_some()
    }

    /// `(n_qubits, n_bits, n_params)` for primitive gates, `None` otherwise.
    pub fn gate_arity(self) -> Option<(u32, u32, u32)> {
        use OpType::*;
        Some(match self {
            Phase => (0, 0, 1),
            X | Y | Z | H | S | Sdg | T | Tdg | V | Vdg => (1, 0, 0),
            Rx | Ry | Rz | U1 => (1, 0, 1),
            U3 => (1, 0, 3),
            CX | CY | CZ | CH | Swap => (2, 0, 0),
            CRz => (2, 0, 1),
            CCX => (3, 0, 0),
            Measure => (1, 1, 0),
            Reset => (1, 0, 0),
            Noop => (1, 0, 0),
            _ => return None,
        })
    }

    /// True for gates in the Clifford group.
    pub fn is_clifford_gate(self) -> bool {
        use OpType::*;
        matches!(self, X | Y | Z | H | S | Sdg | V | Vdg | CX | CY | CZ | Swap)
    }

    /// True for gates diagonal in the computational basis.
    pub fn is_diagonal_gate(self) -> bool {
        use OpType::*;
        matches!(self, Z | S | Sdg | T | Tdg | Rz | U1 | CZ | CRz | Phase)
    }

    /// True for single-qubit unitary gates.
    pub fn is_singleq_unitary(self) -> bool {
        matches!(self.gate_arity(), Some((1, 0, _))) && self != OpType::Reset
    }

    /// The serialization tag.
    pub fn name(self) -> &'static str {
        use OpType::*;
        match self {
            Input => "Input",
            Output => "Output",
            ClInput => "ClInput",
            ClOutput => "ClOutput",
            WasmInput => "WasmInput",
            WasmOutput => "WasmOutput",
            Phase => "Phase",
            X => "X",
            Y => "Y",
            Z => "Z",
            H => "H",
            S => "S",
            Sdg => "Sdg",
            T => "T",
            Tdg => "Tdg",
            V => "V",
            Vdg => "Vdg",
            Rx => "Rx",
            Ry => "Ry",
            Rz => "Rz",
            U1 => "U1",
            U3 => "U3",
            CX => "CX",
            CY => "CY",
            CZ => "CZ",
            CH => "CH",
            CRz => "CRz",
            Swap => "SWAP",
            CCX => "CCX",
            Measure => "Measure",
            Reset => "Reset",
            Noop => "noop",
            Barrier => "Barrier",
            Conditional => "Conditional",
            CircBox => "CircBox",
            Unitary1qBox => "Unitary1qBox",
            Unitary2qBox => "Unitary2qBox",
            Unitary3qBox => "Unitary3qBox",
            ExpBox => "ExpBox",
            PauliExpBox => "PauliExpBox",
            PauliExpPairBox => "PauliExpPairBox",
            PauliExpCommutingSetBox => "PauliExpCommutingSetBox",
            QControlBox => "QControlBox",
            MultiplexorBox => "MultiplexorBox",
            MultiplexedRotationBox => "MultiplexedRotationBox",
            MultiplexedU2Box => "MultiplexedU2Box",
            MultiplexedTensoredU2Box => "MultiplexedTensoredU2Box",
            CustomGate => "CustomGate",
            SetBits => "SetBits",
            CopyBits => "CopyBits",
            ExplicitPredicate => "ExplicitPredicate",
            ExplicitModifier => "ExplicitModifier",
            RangePredicate => "RangePredicate",
            MultiBit => "MultiBit",
            ClassicalTransform => "ClassicalTransform",
            WasmOp => "WASM",
        }
    }

    /// Parse a serialization tag back into a tag value.
    pub fn from_name(name: &str) -> Option<Self> {
        use OpType::*;
        const ALL: &[OpType] = &[
            Input,
            Output,
            ClInput,
            ClOutput,
            WasmInput,
            WasmOutput,
            Phase,
            X,
            Y,
            Z,
            H,
            S,
            Sdg,
            T,
            Tdg,
            V,
            Vdg,
            Rx,
            Ry,
            Rz,
            U1,
            U3,
            CX,
            CY,
            CZ,
            CH,
            CRz,
            Swap,
            CCX,
            Measure,
            Reset,
            Noop,
            Barrier,
            Conditional,
            CircBox,
            Unitary1qBox,
            Unitary2qBox,
            Unitary3qBox,
            ExpBox,
            PauliExpBox,
            PauliExpPairBox,
            PauliExpCommutingSetBox,
            QControlBox,
            MultiplexorBox,
            MultiplexedRotationBox,
            MultiplexedU2Box,
            MultiplexedTensoredU2Box,
            CustomGate,
            SetBits,
            CopyBits,
            ExplicitPredicate,
            ExplicitModifier,
            RangePredicate,
            MultiBit,
            ClassicalTransform,
            WasmOp,
        ];
        ALL.iter().copied().find(|t| t.name() == name)
    }
}
