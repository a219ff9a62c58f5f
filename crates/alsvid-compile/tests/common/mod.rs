//! Dense statevector oracle for unitary-equivalence checks.
//!
//! Test-only: applies a circuit's commands to each computational basis
//! state and compares the resulting columns up to a global phase.

use ndarray::Array1;
use num_complex::Complex64;
use rustc_hash::FxHashMap;

use alsvid_ir::{Circuit, Op, OpType};
use alsvid_types::{Pauli, UnitId};

pub const EPS: f64 = 1e-10;

/// A dense state over the circuit's qubits; qubit `i` is bit `i` of the
/// basis index (little-endian).
pub struct Statevector {
    amps: Array1<Complex64>,
    index: FxHashMap<UnitId, usize>,
}

impl Statevector {
    pub fn basis(qubits: &[UnitId], k: usize) -> Self {
        let n = qubits.len();
        let mut amps = Array1::from_elem(1 << n, Complex64::new(0.0, 0.0));
        amps[k] = Complex64::new(1.0, 0.0);
        let index = qubits
            .iter()
            .enumerate()
            .map(|(i, q)| (q.clone(), i))
            .collect();
        Self { amps, index }
    }

    fn apply_1q(&mut self, m: [Complex64; 4], q: usize) {
        let bit = 1usize << q;
        for k in 0..self.amps.len() {
            if k & bit == 0 {
                let a = self.amps[k];
                let b = self.amps[k | bit];
                self.amps[k] = m[0] * a + m[1] * b;
                self.amps[k | bit] = m[2] * a + m[3] * b;
            }
        }
    }

    fn apply_matrix(&mut self, m: &[Complex64], qs: &[usize]) {
        let k = qs.len();
        let dim = 1usize << k;
        assert_eq!(m.len(), dim * dim);
        let mut new = self.amps.clone();
        for idx in 0..self.amps.len() {
            // Row of the local matrix selected by the bits of idx.
            let mut row = 0usize;
            for (j, &q) in qs.iter().enumerate() {
                if idx & (1 << q) != 0 {
                    row |= 1 << j;
                }
            }
            let mut acc = Complex64::new(0.0, 0.0);
            for col in 0..dim {
                let mut src = idx;
                for (j, &q) in qs.iter().enumerate() {
                    if col & (1 << j) != 0 {
                        src |= 1 << q;
                    } else {
                        src &= !(1 << q);
                    }
                }
                acc += m[row * dim + col] * self.amps[src];
            }
            new[idx] = acc;
        }
        self.amps = new;
    }

    fn apply_pauli_exp(&mut self, paulis: &[Pauli], qs: &[usize], theta: f64) {
        // exp(−iθ/2·P)·v = cos(θ/2)·v − i·sin(θ/2)·P·v
        let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        let mut pv = Array1::from_elem(self.amps.len(), Complex64::new(0.0, 0.0));
        for k in 0..self.amps.len() {
            let mut target = k;
            let mut factor = Complex64::new(1.0, 0.0);
            for (p, &q) in paulis.iter().zip(qs) {
                let bit = 1usize << q;
                match p {
                    Pauli::I => {}
                    Pauli::X => target ^= bit,
                    Pauli::Z => {
                        if k & bit != 0 {
                            factor = -factor;
                        }
                    }
                    Pauli::Y => {
                        factor *= if k & bit != 0 {
                            Complex64::new(0.0, -1.0)
                        } else {
                            Complex64::new(0.0, 1.0)
                        };
                        target ^= bit;
                    }
                }
            }
            pv[target] += factor * self.amps[k];
        }
        let i = Complex64::new(0.0, 1.0);
        for k in 0..self.amps.len() {
            self.amps[k] = c * self.amps[k] - i * s * pv[k];
        }
    }

    fn scale(&mut self, factor: Complex64) {
        for a in self.amps.iter_mut() {
            *a *= factor;
        }
    }

    pub fn apply_op(&mut self, op: &Op, args: &[UnitId]) {
        let qs: Vec<usize> = args.iter().map(|u| self.index[u]).collect();
        match op {
            Op::Gate { gate, params } => {
                let p = |i: usize| params[i].eval().expect("oracle needs numeric params");
                match gate {
                    OpType::Phase => self.scale(Complex64::from_polar(1.0, p(0))),
                    OpType::Noop => {}
                    OpType::CX => {
                        let cbit = 1usize << qs[0];
                        let tbit = 1usize << qs[1];
                        for k in 0..self.amps.len() {
                            if k & cbit != 0 && k & tbit == 0 {
                                self.amps.swap(k, k | tbit);
                            }
                        }
                    }
                    OpType::CY => {
                        let m = gate_matrix_1q(OpType::Y, &[]);
                        self.apply_controlled_1q(qs[0], qs[1], m);
                    }
                    OpType::CZ => {
                        let m = gate_matrix_1q(OpType::Z, &[]);
                        self.apply_controlled_1q(qs[0], qs[1], m);
                    }
                    OpType::CH => {
                        let m = gate_matrix_1q(OpType::H, &[]);
                        self.apply_controlled_1q(qs[0], qs[1], m);
                    }
                    OpType::CRz => {
                        let m = gate_matrix_1q(OpType::Rz, &[p(0)]);
                        self.apply_controlled_1q(qs[0], qs[1], m);
                    }
                    OpType::Swap => {
                        let bit_a = 1usize << qs[0];
                        let bit_b = 1usize << qs[1];
                        for k in 0..self.amps.len() {
                            let a = k & bit_a != 0;
                            let b = k & bit_b != 0;
                            if a && !b {
                                self.amps.swap(k, k ^ bit_a ^ bit_b);
                            }
                        }
                    }
                    OpType::CCX => {
                        let bits = (1usize << qs[0]) | (1usize << qs[1]);
                        let t = 1usize << qs[2];
                        for k in 0..self.amps.len() {
                            if k & bits == bits && k & t == 0 {
                                self.amps.swap(k, k | t);
                            }
                        }
                    }
                    g => {
                        let params: Vec<f64> =
                            (0..params.len()).map(p).collect();
                        self.apply_1q(gate_matrix_1q(*g, &params), qs[0]);
                    }
                }
            }
            Op::Barrier { .. } => {}
            Op::PauliExpBox(b) => {
                let theta = b.t.eval().expect("oracle needs numeric angles");
                self.apply_pauli_exp(&b.paulis, &qs, theta);
            }
            Op::PauliExpPairBox(b) => {
                let t0 = b.t0.eval().expect("numeric");
                let t1 = b.t1.eval().expect("numeric");
                self.apply_pauli_exp(&b.paulis0, &qs[..b.paulis0.len()], t0);
                self.apply_pauli_exp(&b.paulis1, &qs[..b.paulis1.len()], t1);
            }
            Op::PauliExpCommutingSetBox(b) => {
                for (paulis, t) in &b.gadgets {
                    let t = t.eval().expect("numeric");
                    self.apply_pauli_exp(paulis, &qs[..paulis.len()], t);
                }
            }
            Op::Unitary1qBox(b) | Op::Unitary2qBox(b) | Op::Unitary3qBox(b) => {
                self.apply_matrix(&b.matrix, &qs);
            }
            other => panic!("oracle cannot apply {:?}", other.optype()),
        }
    }

    fn apply_controlled_1q(&mut self, control: usize, target: usize, m: [Complex64; 4]) {
        let cbit = 1usize << control;
        let tbit = 1usize << target;
        for k in 0..self.amps.len() {
            if k & cbit != 0 && k & tbit == 0 {
                let a = self.amps[k];
                let b = self.amps[k | tbit];
                self.amps[k] = m[0] * a + m[1] * b;
                self.amps[k | tbit] = m[2] * a + m[3] * b;
            }
        }
    }
}

/// Numeric matrix of a single-qubit gate.
pub fn gate_matrix_1q(gate: OpType, params: &[f64]) -> [Complex64; 4] {
    use std::f64::consts::{FRAC_1_SQRT_2, PI};
    let c = Complex64::new;
    let polar = Complex64::from_polar;
    match gate {
        OpType::X => [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
        OpType::Y => [c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0)],
        OpType::Z => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)],
        OpType::H => [
            c(FRAC_1_SQRT_2, 0.0),
            c(FRAC_1_SQRT_2, 0.0),
            c(FRAC_1_SQRT_2, 0.0),
            c(-FRAC_1_SQRT_2, 0.0),
        ],
        OpType::S => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 1.0)],
        OpType::Sdg => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, -1.0)],
        OpType::T => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), polar(1.0, PI / 4.0)],
        OpType::Tdg => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), polar(1.0, -PI / 4.0)],
        OpType::V => [c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)],
        OpType::Vdg => [c(0.5, -0.5), c(0.5, 0.5), c(0.5, 0.5), c(0.5, -0.5)],
        OpType::Rx => {
            let t = params[0] / 2.0;
            [
                c(t.cos(), 0.0),
                c(0.0, -t.sin()),
                c(0.0, -t.sin()),
                c(t.cos(), 0.0),
            ]
        }
        OpType::Ry => {
            let t = params[0] / 2.0;
            [
                c(t.cos(), 0.0),
                c(-t.sin(), 0.0),
                c(t.sin(), 0.0),
                c(t.cos(), 0.0),
            ]
        }
        OpType::Rz => {
            let t = params[0] / 2.0;
            [polar(1.0, -t), c(0.0, 0.0), c(0.0, 0.0), polar(1.0, t)]
        }
        OpType::U1 => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), polar(1.0, params[0])],
        OpType::U3 => {
            let (t, phi, lam) = (params[0], params[1], params[2]);
            let (ct, st) = ((t / 2.0).cos(), (t / 2.0).sin());
            [
                c(ct, 0.0),
                -polar(st, lam),
                polar(st, phi),
                polar(ct, phi + lam),
            ]
        }
        OpType::Noop => [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)],
        other => panic!("no 1q matrix for {other:?}"),
    }
}

/// The full unitary of a circuit as columns over basis states, with the
/// global phase and implicit permutation applied.
pub fn circuit_unitary(circ: &Circuit) -> Vec<Array1<Complex64>> {
    let qubits = circ.all_qubits();
    let n = qubits.len();
    let commands = circ.commands().expect("oracle circuits are well-formed");
    let phase = circ
        .phase()
        .eval()
        .expect("oracle circuits have numeric phases");
    let perm: FxHashMap<UnitId, UnitId> =
        circ.implicit_qubit_permutation().into_iter().collect();
    let qubit_pos: FxHashMap<UnitId, usize> = qubits
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect();

    (0..(1usize << n))
        .map(|k| {
            let mut sv = Statevector::basis(&qubits, k);
            for cmd in &commands {
                sv.apply_op(&cmd.op, &cmd.args);
            }
            sv.scale(Complex64::from_polar(1.0, phase));
            // Implicit permutation: the value on wire u is presented at
            // output position π(u).
            if perm.iter().any(|(a, b)| a != b) {
                let mut out = Array1::from_elem(sv.amps.len(), Complex64::new(0.0, 0.0));
                for idx in 0..sv.amps.len() {
                    let mut mapped = 0usize;
                    for q in &qubits {
                        let src = qubit_pos[q];
                        let dst = qubit_pos[&perm[q]];
                        if idx & (1 << src) != 0 {
                            mapped |= 1 << dst;
                        }
                    }
                    out[mapped] += sv.amps[idx];
                }
                sv.amps = out;
            }
            sv.amps
        })
        .collect()
}

/// Unitary equivalence up to a single global phase, within `eps`.
pub fn unitary_equiv(a: &Circuit, b: &Circuit, eps: f64) -> bool {
    let ua = circuit_unitary(a);
    let ub = circuit_unitary(b);
    if ua.len() != ub.len() {
        return false;
    }
    let mut phase: Option<Complex64> = None;
    for (col_a, col_b) in ua.iter().zip(&ub) {
        for (x, y) in col_a.iter().zip(col_b) {
            if y.norm() < eps && x.norm() < eps {
                continue;
            }
            if y.norm() < eps || x.norm() < eps {
                return false;
            }
            let ratio = x / y;
            match phase {
                None => {
                    if (ratio.norm() - 1.0).abs() > eps {
                        return false;
                    }
                    phase = Some(ratio);
                }
                Some(p) => {
                    if (ratio - p).norm() > eps {
                        return false;
                    }
                }
            }
        }
    }
    true
}
