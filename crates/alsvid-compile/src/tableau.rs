//! Binary symplectic tableaux for Clifford unitaries.
//!
//! A [`UnitaryTableau`] over qubits `q_0 … q_{n−1}` stores the images
//! `C X_i C†` and `C Z_i C†` of the basis Paulis under conjugation by a
//! Clifford `C`, each as a signed Pauli row. Gates can be composed onto
//! either end of `C`, Pauli strings can be conjugated through it, and
//! the whole tableau can be synthesized back into a circuit by Gaussian
//! elimination.

use rustc_hash::FxHashMap;

use alsvid_ir::{Circuit, OpType};
use alsvid_types::{Pauli, QuarterTurns, SpPauliStabiliser, UnitId};

use crate::error::{CompileError, CompileResult};

/// A signed Pauli string over the tableau's qubits, in x/z bit form.
/// Site `(x, z) = (1, 1)` is Y exactly (no hidden i).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauliRow {
    /// X bits.
    pub x: Vec<bool>,
    /// Z bits.
    pub z: Vec<bool>,
    /// True for a −1 sign.
    pub sign: bool,
}

impl PauliRow {
    fn identity(n: usize) -> Self {
        Self {
            x: vec![false; n],
            z: vec![false; n],
            sign: false,
        }
    }

    fn basis_x(n: usize, q: usize) -> Self {
        let mut row = Self::identity(n);
        row.x[q] = true;
        row
    }

    fn basis_z(n: usize, q: usize) -> Self {
        let mut row = Self::identity(n);
        row.z[q] = true;
        row
    }

    /// The Pauli letter at a site.
    pub fn pauli(&self, q: usize) -> Pauli {
        match (self.x[q], self.z[q]) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (false, true) => Pauli::Z,
            (true, true) => Pauli::Y,
        }
    }

    fn set_pauli(&mut self, q: usize, p: Pauli) {
        let (x, z) = match p {
            Pauli::I => (false, false),
            Pauli::X => (true, false),
            Pauli::Z => (false, true),
            Pauli::Y => (true, true),
        };
        self.x[q] = x;
        self.z[q] = z;
    }

    /// Hermitian product `i^extra · a · b`; the total phase must come
    /// out real.
    fn mul_with_turns(a: &PauliRow, b: &PauliRow, extra: u8) -> PauliRow {
        let n = a.x.len();
        let mut out = PauliRow::identity(n);
        let mut turns =
            (extra + if a.sign { 2 } else { 0 } + if b.sign { 2 } else { 0 }) % 4;
        for q in 0..n {
            let (t, p) = Pauli::multiply(a.pauli(q), b.pauli(q));
            turns = (turns + t) % 4;
            out.set_pauli(q, p);
        }
        debug_assert!(turns % 2 == 0, "row product must be Hermitian");
        out.sign = turns == 2;
        out
    }

    // Per-site conjugation rules for composing a gate onto the end of
    // the tableau's Clifford.

    fn conj_h(&mut self, q: usize) {
        self.sign ^= self.x[q] & self.z[q];
        let tmp = self.x[q];
        self.x[q] = self.z[q];
        self.z[q] = tmp;
    }

    fn conj_s(&mut self, q: usize) {
        self.sign ^= self.x[q] & self.z[q];
        self.z[q] ^= self.x[q];
    }

    fn conj_sdg(&mut self, q: usize) {
        self.sign ^= self.x[q] & !self.z[q];
        self.z[q] ^= self.x[q];
    }

    fn conj_v(&mut self, q: usize) {
        self.sign ^= !self.x[q] & self.z[q];
        self.x[q] ^= self.z[q];
    }

    fn conj_vdg(&mut self, q: usize) {
        self.sign ^= self.x[q] & self.z[q];
        self.x[q] ^= self.z[q];
    }

    fn conj_x(&mut self, q: usize) {
        self.sign ^= self.z[q];
    }

    fn conj_y(&mut self, q: usize) {
        self.sign ^= self.x[q] ^ self.z[q];
    }

    fn conj_z(&mut self, q: usize) {
        self.sign ^= self.x[q];
    }

    fn conj_cx(&mut self, c: usize, t: usize) {
        self.sign ^= self.x[c] & self.z[t] & !(self.x[t] ^ self.z[c]);
        self.x[t] ^= self.x[c];
        self.z[c] ^= self.z[t];
    }

    fn conj_swap(&mut self, a: usize, b: usize) {
        self.x.swap(a, b);
        self.z.swap(a, b);
    }

    /// Conjugate this row by a Clifford gate.
    pub fn apply_gate(&mut self, gate: OpType, qs: &[usize]) -> CompileResult<()> {
        match gate {
            OpType::H => self.conj_h(qs[0]),
            OpType::S => self.conj_s(qs[0]),
            OpType::Sdg => self.conj_sdg(qs[0]),
            OpType::V => self.conj_v(qs[0]),
            OpType::Vdg => self.conj_vdg(qs[0]),
            OpType::X => self.conj_x(qs[0]),
            OpType::Y => self.conj_y(qs[0]),
            OpType::Z => self.conj_z(qs[0]),
            OpType::CX => self.conj_cx(qs[0], qs[1]),
            OpType::CZ => {
                self.conj_h(qs[1]);
                self.conj_cx(qs[0], qs[1]);
                self.conj_h(qs[1]);
            }
            OpType::CY => {
                self.conj_sdg(qs[1]);
                self.conj_cx(qs[0], qs[1]);
                self.conj_s(qs[1]);
            }
            OpType::Swap => self.conj_swap(qs[0], qs[1]),
            OpType::Noop => {}
            other => return Err(CompileError::UnsupportedOp(other)),
        }
        Ok(())
    }

    /// Lay a sparse stabiliser out over an ordered qubit list. The
    /// coefficient must be ±1 (even quarter turns).
    pub fn from_sparse(tensor: &SpPauliStabiliser, qubits: &[UnitId]) -> Self {
        let n = qubits.len();
        let mut row = Self::identity(n);
        debug_assert!(tensor.coeff.turns() % 2 == 0);
        row.sign = tensor.coeff.turns() == 2;
        for (i, q) in qubits.iter().enumerate() {
            row.set_pauli(i, tensor.get(q));
        }
        row
    }

    /// Indices of non-identity sites, ascending.
    pub fn support(&self) -> Vec<usize> {
        (0..self.x.len())
            .filter(|&q| self.x[q] || self.z[q])
            .collect()
    }

    /// True iff the row has no X component anywhere.
    pub fn is_diagonal(&self) -> bool {
        self.x.iter().all(|&b| !b)
    }
}

/// Tableau of a Clifford unitary over a fixed ordered qubit set.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitaryTableau {
    qubits: Vec<UnitId>,
    index: FxHashMap<UnitId, usize>,
    xrows: Vec<PauliRow>,
    zrows: Vec<PauliRow>,
}

impl UnitaryTableau {
    /// The identity Clifford over the given qubits.
    pub fn identity(qubits: Vec<UnitId>) -> Self {
        let n = qubits.len();
        let index = qubits
            .iter()
            .enumerate()
            .map(|(i, q)| (q.clone(), i))
            .collect();
        Self {
            qubits,
            index,
            xrows: (0..n).map(|q| PauliRow::basis_x(n, q)).collect(),
            zrows: (0..n).map(|q| PauliRow::basis_z(n, q)).collect(),
        }
    }

    /// Number of qubits.
    pub fn n_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// The ordered qubit set.
    pub fn qubits(&self) -> &[UnitId] {
        &self.qubits
    }

    /// The index of a qubit in the tableau.
    pub fn qubit_index(&self, q: &UnitId) -> Option<usize> {
        self.index.get(q).copied()
    }

    /// The image of `X_q`.
    pub fn xrow(&self, q: usize) -> &PauliRow {
        &self.xrows[q]
    }

    /// The image of `Z_q`.
    pub fn zrow(&self, q: usize) -> &PauliRow {
        &self.zrows[q]
    }

    /// True iff the tableau is the identity.
    pub fn is_identity(&self) -> bool {
        let n = self.n_qubits();
        (0..n).all(|q| {
            self.xrows[q] == PauliRow::basis_x(n, q) && self.zrows[q] == PauliRow::basis_z(n, q)
        })
    }

    /// Compose a Clifford gate onto the end of the circuit: `C ← G·C`.
    pub fn apply_gate_end(&mut self, gate: OpType, qs: &[usize]) -> CompileResult<()> {
        let conj_all = |rows: &mut Vec<PauliRow>, f: &dyn Fn(&mut PauliRow)| {
            for row in rows.iter_mut() {
                f(row);
            }
        };
        let both = |t: &mut Self, f: &dyn Fn(&mut PauliRow)| {
            conj_all(&mut t.xrows, f);
            conj_all(&mut t.zrows, f);
        };
        match gate {
            OpType::H => both(self, &|r| r.conj_h(qs[0])),
            OpType::S => both(self, &|r| r.conj_s(qs[0])),
            OpType::Sdg => both(self, &|r| r.conj_sdg(qs[0])),
            OpType::V => both(self, &|r| r.conj_v(qs[0])),
            OpType::Vdg => both(self, &|r| r.conj_vdg(qs[0])),
            OpType::X => both(self, &|r| r.conj_x(qs[0])),
            OpType::Y => both(self, &|r| r.conj_y(qs[0])),
            OpType::Z => both(self, &|r| r.conj_z(qs[0])),
            OpType::CX => both(self, &|r| r.conj_cx(qs[0], qs[1])),
            OpType::CZ => {
                self.apply_gate_end(OpType::H, &[qs[1]])?;
                self.apply_gate_end(OpType::CX, qs)?;
                self.apply_gate_end(OpType::H, &[qs[1]])?;
            }
            OpType::CY => {
                self.apply_gate_end(OpType::Sdg, &[qs[1]])?;
                self.apply_gate_end(OpType::CX, qs)?;
                self.apply_gate_end(OpType::S, &[qs[1]])?;
            }
            OpType::Swap => both(self, &|r| r.conj_swap(qs[0], qs[1])),
            OpType::Noop => {}
            other => return Err(CompileError::UnsupportedOp(other)),
        }
        Ok(())
    }

    /// Compose a Clifford gate onto the front of the circuit: `C ← C·G`.
    pub fn apply_gate_front(&mut self, gate: OpType, qs: &[usize]) -> CompileResult<()> {
        match gate {
            OpType::H => {
                let q = qs[0];
                let x = self.xrows[q].clone();
                self.xrows[q] = self.zrows[q].clone();
                self.zrows[q] = x;
            }
            // S: X → Y = i·X·Z; Z fixed.
            OpType::S => {
                let q = qs[0];
                self.xrows[q] = PauliRow::mul_with_turns(&self.xrows[q], &self.zrows[q], 1);
            }
            OpType::Sdg => {
                let q = qs[0];
                self.xrows[q] = PauliRow::mul_with_turns(&self.xrows[q], &self.zrows[q], 3);
            }
            // V: Z → −Y = −i·X·Z; X fixed.
            OpType::V => {
                let q = qs[0];
                self.zrows[q] = PauliRow::mul_with_turns(&self.xrows[q], &self.zrows[q], 3);
            }
            OpType::Vdg => {
                let q = qs[0];
                self.zrows[q] = PauliRow::mul_with_turns(&self.xrows[q], &self.zrows[q], 1);
            }
            OpType::X => self.zrows[qs[0]].sign ^= true,
            OpType::Z => self.xrows[qs[0]].sign ^= true,
            OpType::Y => {
                self.xrows[qs[0]].sign ^= true;
                self.zrows[qs[0]].sign ^= true;
            }
            OpType::CX => {
                let (c, t) = (qs[0], qs[1]);
                self.xrows[c] = PauliRow::mul_with_turns(&self.xrows[c], &self.xrows[t], 0);
                self.zrows[t] = PauliRow::mul_with_turns(&self.zrows[t], &self.zrows[c], 0);
            }
            OpType::CZ => {
                self.apply_gate_front(OpType::H, &[qs[1]])?;
                self.apply_gate_front(OpType::CX, qs)?;
                self.apply_gate_front(OpType::H, &[qs[1]])?;
            }
            OpType::CY => {
                self.apply_gate_front(OpType::S, &[qs[1]])?;
                self.apply_gate_front(OpType::CX, qs)?;
                self.apply_gate_front(OpType::Sdg, &[qs[1]])?;
            }
            OpType::Swap => {
                self.xrows.swap(qs[0], qs[1]);
                self.zrows.swap(qs[0], qs[1]);
            }
            OpType::Noop => {}
            other => return Err(CompileError::UnsupportedOp(other)),
        }
        Ok(())
    }

    /// Conjugate a sparse Pauli stabiliser through the tableau:
    /// each site expands into the corresponding rows.
    pub fn conjugate(&self, p: &SpPauliStabiliser) -> SpPauliStabiliser {
        let n = self.n_qubits();
        let mut acc = vec![Pauli::I; n];
        let mut turns = p.coeff.turns();
        let mut mult = |acc: &mut Vec<Pauli>, turns: &mut u8, row: &PauliRow| {
            if row.sign {
                *turns = (*turns + 2) % 4;
            }
            for i in 0..n {
                let (t, np) = Pauli::multiply(acc[i], row.pauli(i));
                *turns = (*turns + t) % 4;
                acc[i] = np;
            }
        };
        for (q, pauli) in &p.string.0 {
            let Some(&i) = self.index.get(q) else {
                continue;
            };
            match pauli {
                Pauli::I => {}
                Pauli::X => mult(&mut acc, &mut turns, &self.xrows[i]),
                Pauli::Z => mult(&mut acc, &mut turns, &self.zrows[i]),
                Pauli::Y => {
                    turns = (turns + 1) % 4;
                    mult(&mut acc, &mut turns, &self.xrows[i]);
                    mult(&mut acc, &mut turns, &self.zrows[i]);
                }
            }
        }
        let mut out = SpPauliStabiliser::from_pairs(
            acc.into_iter()
                .enumerate()
                .filter(|(_, p)| *p != Pauli::I)
                .map(|(i, p)| (self.qubits[i].clone(), p)),
        );
        out.coeff = QuarterTurns::new(turns);
        out
    }

    /// Synthesize a circuit realising this tableau, by reducing a copy
    /// to the identity with Clifford gates and replaying their daggers
    /// in reverse.
    pub fn synthesize(&self) -> CompileResult<Circuit> {
        let n = self.n_qubits();
        let mut work = self.clone();
        let mut applied: Vec<(OpType, Vec<usize>)> = Vec::new();
        let mut push = |work: &mut UnitaryTableau,
                        applied: &mut Vec<(OpType, Vec<usize>)>,
                        gate: OpType,
                        qs: Vec<usize>|
         -> CompileResult<()> {
            work.apply_gate_end(gate, &qs)?;
            applied.push((gate, qs));
            Ok(())
        };

        for i in 0..n {
            // Bring the image of X_i to exactly X_i.
            if !work.xrows[i].x.iter().skip(i).any(|&b| b) {
                let j = (i..n)
                    .find(|&j| work.xrows[i].z[j])
                    .expect("tableau rows are independent");
                push(&mut work, &mut applied, OpType::H, vec![j])?;
            }
            let j = (i..n)
                .find(|&j| work.xrows[i].x[j])
                .expect("x pivot exists after basis change");
            if j != i {
                push(&mut work, &mut applied, OpType::Swap, vec![i, j])?;
            }
            for k in (i + 1)..n {
                if work.xrows[i].x[k] {
                    push(&mut work, &mut applied, OpType::CX, vec![i, k])?;
                }
            }
            if work.xrows[i].z[i] {
                push(&mut work, &mut applied, OpType::S, vec![i])?;
            }
            for k in (i + 1)..n {
                if work.xrows[i].z[k] {
                    push(&mut work, &mut applied, OpType::CZ, vec![i, k])?;
                }
            }
            if work.xrows[i].sign {
                push(&mut work, &mut applied, OpType::Z, vec![i])?;
            }

            // Bring the image of Z_i to exactly Z_i, preserving X_i.
            if work.zrows[i].x[i] {
                push(&mut work, &mut applied, OpType::V, vec![i])?;
            }
            for k in (i + 1)..n {
                match work.zrows[i].pauli(k) {
                    Pauli::X => push(&mut work, &mut applied, OpType::H, vec![k])?,
                    Pauli::Y => push(&mut work, &mut applied, OpType::V, vec![k])?,
                    _ => {}
                }
            }
            for k in (i + 1)..n {
                if work.zrows[i].z[k] {
                    push(&mut work, &mut applied, OpType::CX, vec![k, i])?;
                }
            }
            if work.zrows[i].sign {
                push(&mut work, &mut applied, OpType::X, vec![i])?;
            }
        }
        debug_assert!(work.is_identity(), "elimination must reach the identity");

        // applied reduces C to I, so C = applied₁† ⋯ appliedₘ† with the
        // last-applied gate acting first.
        let mut circ = Circuit::new();
        for q in &self.qubits {
            circ.add_qubit(q.clone())
                .map_err(CompileError::Ir)?;
        }
        for (gate, qs) in applied.into_iter().rev() {
            let dag = match gate {
                OpType::S => OpType::Sdg,
                OpType::V => OpType::Vdg,
                other => other,
            };
            let args: Vec<UnitId> = qs.iter().map(|&q| self.qubits[q].clone()).collect();
            circ.add_gate(dag, vec![], &args).map_err(CompileError::Ir)?;
        }
        Ok(circ)
    }

    /// Build the tableau of a purely Clifford circuit.
    pub fn from_circuit(circ: &Circuit) -> CompileResult<Self> {
        let mut tab = Self::identity(circ.all_qubits());
        for cmd in circ.commands().map_err(CompileError::Ir)? {
            let qs: Vec<usize> = cmd
                .args
                .iter()
                .filter_map(|u| tab.qubit_index(u))
                .collect();
            tab.apply_gate_end(cmd.op.optype(), &qs)?;
        }
        Ok(tab)
    }
}
