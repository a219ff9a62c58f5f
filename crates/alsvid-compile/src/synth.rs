//! Synthesis of Pauli graphs back into circuits.

use alsvid_ir::{Circuit, IrResult, OpType};
use alsvid_types::{Expr, UnitId};

use crate::error::{CompileError, CompileResult};
use crate::pauligraph::{PauliGraph, PauliRotation};
use crate::tableau::PauliRow;

/// Gadget-level synthesis strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthStrategy {
    /// Emit each exponential separately.
    Individual,
    /// Emit anti-commuting adjacent gadgets through a shared template.
    Pairwise,
    /// Partition into commuting sets, mutually diagonalize, emit
    /// diagonal rotations, uncompute.
    #[default]
    Sets,
}

/// Shape of the CX tree used to collect parities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CXConfig {
    /// A chain along the support, closed by a controlled phase rotation
    /// so the last site is never entered by a CX.
    #[default]
    Snake,
    /// All support qubits fan into the target.
    Star,
    /// A balanced binary fan-in tree.
    Tree,
    /// A fan-in tree of arity 3 (stands in for multi-qubit phase
    /// primitives).
    MultiQGate,
}

/// Synthesize a Pauli graph into a circuit.
///
/// The result applies the rotations in dependency order, then the
/// trailing Clifford, then the terminal measurements; its unitary
/// matches the source circuit's up to numerical tolerance.
pub fn synthesise_pauli_graph(
    pg: &PauliGraph,
    strategy: SynthStrategy,
    cx_config: CXConfig,
) -> CompileResult<Circuit> {
    let mut circ = Circuit::new();
    for q in pg.qubits() {
        circ.add_qubit(q.clone()).map_err(CompileError::Ir)?;
    }
    for b in pg.bits() {
        circ.add_bit(b.clone()).map_err(CompileError::Ir)?;
    }

    match strategy {
        SynthStrategy::Individual => {
            for rot in pg.rotations_in_order() {
                append_gadget(&mut circ, pg.qubits(), rot, cx_config)
                    .map_err(CompileError::Ir)?;
            }
        }
        SynthStrategy::Pairwise => {
            let rots = pg.rotations_in_order();
            let mut i = 0;
            while i < rots.len() {
                if i + 1 < rots.len()
                    && !rots[i].tensor.commutes_with(&rots[i + 1].tensor)
                {
                    append_pair(&mut circ, pg.qubits(), rots[i], rots[i + 1])?;
                    i += 2;
                } else {
                    append_gadget(&mut circ, pg.qubits(), rots[i], cx_config)
                        .map_err(CompileError::Ir)?;
                    i += 1;
                }
            }
        }
        SynthStrategy::Sets => {
            for set in pg.commuting_sets() {
                append_commuting_set(&mut circ, pg.qubits(), &set, cx_config)?;
            }
        }
    }

    let cliff_circ = pg.clifford().synthesize()?;
    circ.append(&cliff_circ).map_err(CompileError::Ir)?;
    for (q, b) in pg.measures() {
        circ.add_measure(q.clone(), b.clone())
            .map_err(CompileError::Ir)?;
    }
    circ.add_phase(pg.phase().clone());
    Ok(circ)
}

/// Resynthesize a circuit through its Pauli graph.
///
/// Fails with [`CompileError::UnsupportedOp`] on circuits the graph
/// construction cannot express (conditionals, resets, unknown boxes) and
/// with [`CompileError::MidCircuitMeasurement`] on non-terminal
/// measurements; the circuit is unchanged in those cases.
pub fn pauli_simp(strategy: SynthStrategy, cx_config: CXConfig) -> crate::transform::Transform {
    crate::transform::Transform::new("pauli_simp", move |circ| {
        let pg = PauliGraph::from_circuit(circ)?;
        let out = synthesise_pauli_graph(&pg, strategy, cx_config)?;
        let changed = *circ != out;
        *circ = out;
        Ok(changed)
    })
}

/// Pre-rotation mapping each site's letter into Z, and its inverse.
fn basis_change(row: &PauliRow, q: usize) -> Option<(OpType, OpType)> {
    match row.pauli(q) {
        alsvid_types::Pauli::X => Some((OpType::H, OpType::H)),
        alsvid_types::Pauli::Y => Some((OpType::V, OpType::Vdg)),
        _ => None,
    }
}

/// Emit CX parity collection onto the last support qubit, returning the
/// gate list (to be replayed in reverse to uncompute).
fn parity_tree(support: &[usize], cx_config: CXConfig) -> Vec<(usize, usize)> {
    let mut cxs = Vec::new();
    match cx_config {
        CXConfig::Snake => {
            for pair in support.windows(2) {
                cxs.push((pair[0], pair[1]));
            }
        }
        CXConfig::Star => {
            let target = *support.last().expect("support is non-empty");
            for &q in &support[..support.len() - 1] {
                cxs.push((q, target));
            }
        }
        CXConfig::Tree | CXConfig::MultiQGate => {
            let arity = if cx_config == CXConfig::Tree { 2 } else { 3 };
            let mut alive: Vec<usize> = support.to_vec();
            while alive.len() > 1 {
                let mut next = Vec::new();
                for group in alive.chunks(arity) {
                    let target = *group.last().expect("chunks are non-empty");
                    for &q in &group[..group.len() - 1] {
                        cxs.push((q, target));
                    }
                    next.push(target);
                }
                alive = next;
            }
        }
    }
    cxs
}

/// Append one Pauli exponential as basis changes, a CX parity tree and a
/// Z rotation.
pub fn append_gadget(
    circ: &mut Circuit,
    qubits: &[UnitId],
    rot: &PauliRotation,
    cx_config: CXConfig,
) -> IrResult<()> {
    let row = PauliRow::from_sparse(&rot.tensor, qubits);
    let support = row.support();
    if support.is_empty() {
        return Ok(());
    }
    let angle = if row.sign {
        (-rot.angle.clone()).simplify()
    } else {
        rot.angle.clone()
    };
    let uid = |q: usize| qubits[q].clone();

    for &q in &support {
        if let Some((pre, _)) = basis_change(&row, q) {
            circ.add_gate(pre, vec![], &[uid(q)])?;
        }
    }
    let cxs = parity_tree(&support, cx_config);
    for &(c, t) in &cxs {
        circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])?;
    }
    let target = cxs.last().map_or(support[support.len() - 1], |&(_, t)| t);
    circ.add_gate(OpType::Rz, vec![angle], &[uid(target)])?;
    for &(c, t) in cxs.iter().rev() {
        circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])?;
    }
    for &q in &support {
        if let Some((_, post)) = basis_change(&row, q) {
            circ.add_gate(post, vec![], &[uid(q)])?;
        }
    }
    Ok(())
}

/// Append two anti-commuting exponentials through a shared Clifford
/// frame that maps the first to `Z` and the second to `X` on a single
/// pivot qubit.
pub fn append_pair(
    circ: &mut Circuit,
    qubits: &[UnitId],
    first: &PauliRotation,
    second: &PauliRotation,
) -> CompileResult<()> {
    let mut p = PauliRow::from_sparse(&first.tensor, qubits);
    let mut q = PauliRow::from_sparse(&second.tensor, qubits);
    let mut frame: Vec<(OpType, Vec<usize>)> = Vec::new();
    let mut push = |p: &mut PauliRow,
                    q: &mut PauliRow,
                    frame: &mut Vec<(OpType, Vec<usize>)>,
                    gate: OpType,
                    qs: Vec<usize>|
     -> CompileResult<()> {
        p.apply_gate(gate, &qs)?;
        q.apply_gate(gate, &qs)?;
        frame.push((gate, qs));
        Ok(())
    };

    // Reduce the first string to Z on a pivot.
    let support = p.support();
    for &s in &support {
        if let Some((pre, _)) = basis_change(&p, s) {
            push(&mut p, &mut q, &mut frame, pre, vec![s])?;
        }
    }
    for pair in support.windows(2) {
        push(&mut p, &mut q, &mut frame, OpType::CX, vec![pair[0], pair[1]])?;
    }
    let pivot = *support.last().expect("rotations act on at least one qubit");
    debug_assert_eq!(p.support(), vec![pivot]);

    // The second string anti-commutes, so it carries X or Y at the
    // pivot; normalise to X.
    if q.z[pivot] {
        push(&mut p, &mut q, &mut frame, OpType::S, vec![pivot])?;
    }
    // Map residual letters to Z, then absorb them with CZs from the
    // pivot (which leave Z_pivot untouched).
    let q_support = q.support();
    for &s in &q_support {
        if s == pivot {
            continue;
        }
        if let Some((pre, _)) = basis_change(&q, s) {
            push(&mut p, &mut q, &mut frame, pre, vec![s])?;
        }
    }
    for &s in &q_support {
        if s != pivot && q.z[s] {
            push(&mut p, &mut q, &mut frame, OpType::CZ, vec![pivot, s])?;
        }
    }
    debug_assert_eq!(q.support(), vec![pivot]);
    debug_assert!(q.x[pivot] && !q.z[pivot]);

    let angle1 = if p.sign {
        (-first.angle.clone()).simplify()
    } else {
        first.angle.clone()
    };
    let angle2 = if q.sign {
        (-second.angle.clone()).simplify()
    } else {
        second.angle.clone()
    };

    let uid = |i: usize| qubits[i].clone();
    for (gate, qs) in &frame {
        let args: Vec<UnitId> = qs.iter().map(|&i| uid(i)).collect();
        circ.add_gate(*gate, vec![], &args).map_err(CompileError::Ir)?;
    }
    circ.add_gate(OpType::Rz, vec![angle1], &[uid(pivot)])
        .map_err(CompileError::Ir)?;
    circ.add_gate(OpType::Rx, vec![angle2], &[uid(pivot)])
        .map_err(CompileError::Ir)?;
    for (gate, qs) in frame.iter().rev() {
        let dag = match gate {
            OpType::S => OpType::Sdg,
            OpType::Sdg => OpType::S,
            OpType::V => OpType::Vdg,
            OpType::Vdg => OpType::V,
            other => *other,
        };
        let args: Vec<UnitId> = qs.iter().map(|&i| uid(i)).collect();
        circ.add_gate(dag, vec![], &args).map_err(CompileError::Ir)?;
    }
    Ok(())
}

/// Close a Z-parity gadget with a controlled phase: for a wire `a`
/// carrying the accumulated parity and the untouched last site `b`,
/// `exp(−iθ/2·Z_a·Z_b) = Rz(θ)(b) · CRz(−2θ)(a, b)` exactly, saving the
/// final CX pair of the chain.
fn append_phase_closure(
    circ: &mut Circuit,
    angle: &Expr,
    last: usize,
    parity_wire: Option<usize>,
    uid: &dyn Fn(usize) -> UnitId,
) -> CompileResult<()> {
    circ.add_gate(OpType::Rz, vec![angle.clone()], &[uid(last)])
        .map_err(CompileError::Ir)?;
    if let Some(a) = parity_wire {
        let mu = (Expr::constant(-2.0) * angle.clone()).simplify();
        circ.add_gate(OpType::CRz, vec![mu], &[uid(a), uid(last)])
            .map_err(CompileError::Ir)?;
    }
    Ok(())
}

/// True iff the rows' supports form a chain under inclusion.
fn supports_nest(rows: &[PauliRow]) -> bool {
    let mut supports: Vec<Vec<usize>> = rows.iter().map(PauliRow::support).collect();
    supports.sort_by_key(Vec::len);
    supports
        .windows(2)
        .all(|w| w[0].iter().all(|q| w[1].contains(q)))
}

/// Find a Clifford frame (as a gate list) that maps every string of a
/// commuting set to a Z-string, and the conjugated rows themselves.
pub fn diagonalise_commuting_set(
    rows: &mut [PauliRow],
    n: usize,
) -> CompileResult<Vec<(OpType, Vec<usize>)>> {
    let mut gates: Vec<(OpType, Vec<usize>)> = Vec::new();
    let mut push = |rows: &mut [PauliRow],
                    gates: &mut Vec<(OpType, Vec<usize>)>,
                    gate: OpType,
                    qs: Vec<usize>|
     -> CompileResult<()> {
        for row in rows.iter_mut() {
            row.apply_gate(gate, &qs)?;
        }
        gates.push((gate, qs));
        Ok(())
    };

    // Per-qubit normalisation: a column carrying a single non-Z letter
    // rotates to Z locally.
    for c in 0..n {
        let letters: Vec<alsvid_types::Pauli> = rows
            .iter()
            .map(|r| r.pauli(c))
            .filter(|p| *p != alsvid_types::Pauli::I)
            .collect();
        if letters.is_empty() {
            continue;
        }
        if letters.iter().all(|p| *p == alsvid_types::Pauli::X) {
            push(rows, &mut gates, OpType::H, vec![c])?;
        } else if letters.iter().all(|p| *p == alsvid_types::Pauli::Y) {
            push(rows, &mut gates, OpType::V, vec![c])?;
        }
    }
    if rows.iter().all(PauliRow::is_diagonal) {
        return Ok(gates);
    }

    // Gaussian elimination of the X block on scratch copies; row
    // products are legal because a Clifford diagonalising a generating
    // set diagonalises every product.
    let mut scratch: Vec<(Vec<bool>, Vec<bool>)> =
        rows.iter().map(|r| (r.x.clone(), r.z.clone())).collect();
    let mut pivots: Vec<(usize, usize)> = Vec::new();
    for c in 0..n {
        let pivot = (0..scratch.len())
            .find(|&r| scratch[r].0[c] && pivots.iter().all(|(pr, _)| *pr != r));
        let Some(r) = pivot else {
            continue;
        };
        pivots.push((r, c));
        for r2 in 0..scratch.len() {
            if r2 != r && scratch[r2].0[c] {
                for i in 0..n {
                    let (x, z) = (scratch[r].0[i], scratch[r].1[i]);
                    scratch[r2].0[i] ^= x;
                    scratch[r2].1[i] ^= z;
                }
            }
        }
    }

    // Clear off-pivot X entries with CXs out of the pivot column.
    for &(r, c) in &pivots {
        for c2 in 0..n {
            if c2 != c && scratch[r].0[c2] {
                push(rows, &mut gates, OpType::CX, vec![c, c2])?;
                for row in scratch.iter_mut() {
                    row.0[c2] ^= row.0[c];
                    let zc2 = row.1[c2];
                    row.1[c] ^= zc2;
                }
            }
        }
    }

    // Graph-state cleanup: S for Y pivots, CZ for mutual Z pairs, then
    // H turns every pivot X into Z.
    for &(r, c) in &pivots {
        if scratch[r].1[c] {
            push(rows, &mut gates, OpType::S, vec![c])?;
            for row in scratch.iter_mut() {
                let x = row.0[c];
                row.1[c] ^= x;
            }
        }
    }
    for (i, &(r1, c1)) in pivots.iter().enumerate() {
        for &(r2, c2) in &pivots[i + 1..] {
            if scratch[r1].1[c2] {
                push(rows, &mut gates, OpType::CZ, vec![c1, c2])?;
                for row in scratch.iter_mut() {
                    let (xa, xb) = (row.0[c1], row.0[c2]);
                    row.1[c2] ^= xa;
                    row.1[c1] ^= xb;
                }
                debug_assert!(!scratch[r2].1[c1]);
            }
        }
    }
    for &(_, c) in &pivots {
        push(rows, &mut gates, OpType::H, vec![c])?;
    }

    if !rows.iter().all(PauliRow::is_diagonal) {
        return Err(CompileError::UnsupportedOp(OpType::PauliExpCommutingSetBox));
    }
    Ok(gates)
}

/// Append a commuting set: diagonalize, emit Z-string rotations with the
/// configured CX tree, uncompute.
pub fn append_commuting_set(
    circ: &mut Circuit,
    qubits: &[UnitId],
    set: &[&PauliRotation],
    cx_config: CXConfig,
) -> CompileResult<()> {
    let n = qubits.len();
    let mut rows: Vec<PauliRow> = set
        .iter()
        .map(|rot| PauliRow::from_sparse(&rot.tensor, qubits))
        .collect();
    let frame = diagonalise_commuting_set(&mut rows, n)?;

    let uid = |i: usize| qubits[i].clone();
    for (gate, qs) in &frame {
        let args: Vec<UnitId> = qs.iter().map(|&i| uid(i)).collect();
        circ.add_gate(*gate, vec![], &args).map_err(CompileError::Ir)?;
    }
    let angles: Vec<Expr> = set
        .iter()
        .zip(&rows)
        .map(|(rot, row)| {
            if row.sign {
                (-rot.angle.clone()).simplify()
            } else {
                rot.angle.clone()
            }
        })
        .collect();
    if cx_config == CXConfig::Snake && supports_nest(&rows) {
        // Nested supports share one chain. The chain collects parities
        // of the first m−1 sites only; the longest string closes its
        // parity with a controlled phase, so the chain never has to
        // reach the last site and come back.
        let mut order: Vec<(usize, Vec<usize>)> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.support()))
            .collect();
        order.sort_by_key(|(_, s)| s.len());
        let mut chain: Vec<usize> = Vec::new();
        for (_, s) in &order {
            for &q in s {
                if !chain.contains(&q) {
                    chain.push(q);
                }
            }
        }
        let m = chain.len();
        let cx_pairs: Vec<(usize, usize)> = (0..m.saturating_sub(2))
            .map(|i| (chain[i], chain[i + 1]))
            .collect();
        for &(c, t) in &cx_pairs {
            circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                .map_err(CompileError::Ir)?;
        }
        for (i, s) in &order {
            let k = s.len();
            if k == 0 {
                continue;
            }
            if k < m {
                // Parity of the first k sites already sits on a wire.
                circ.add_gate(OpType::Rz, vec![angles[*i].clone()], &[uid(chain[k - 1])])
                    .map_err(CompileError::Ir)?;
            } else {
                let parity_wire = if m >= 2 { Some(chain[m - 2]) } else { None };
                append_phase_closure(circ, &angles[*i], chain[m - 1], parity_wire, &uid)?;
            }
        }
        for &(c, t) in cx_pairs.iter().rev() {
            circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                .map_err(CompileError::Ir)?;
        }
    } else if cx_config == CXConfig::Snake {
        for (row, angle) in rows.iter().zip(&angles) {
            let support = row.support();
            let w = support.len();
            if w == 0 {
                continue;
            }
            let cx_pairs: Vec<(usize, usize)> = (0..w.saturating_sub(2))
                .map(|i| (support[i], support[i + 1]))
                .collect();
            for &(c, t) in &cx_pairs {
                circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                    .map_err(CompileError::Ir)?;
            }
            let parity_wire = if w >= 2 { Some(support[w - 2]) } else { None };
            append_phase_closure(circ, angle, support[w - 1], parity_wire, &uid)?;
            for &(c, t) in cx_pairs.iter().rev() {
                circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                    .map_err(CompileError::Ir)?;
            }
        }
    } else {
        for (row, angle) in rows.iter().zip(&angles) {
            let support = row.support();
            if support.is_empty() {
                continue;
            }
            let cxs = parity_tree(&support, cx_config);
            for &(c, t) in &cxs {
                circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                    .map_err(CompileError::Ir)?;
            }
            let target = cxs.last().map_or(support[support.len() - 1], |&(_, t)| t);
            circ.add_gate(OpType::Rz, vec![angle.clone()], &[uid(target)])
                .map_err(CompileError::Ir)?;
            for &(c, t) in cxs.iter().rev() {
                circ.add_gate(OpType::CX, vec![], &[uid(c), uid(t)])
                    .map_err(CompileError::Ir)?;
            }
        }
    }
    for (gate, qs) in frame.iter().rev() {
        let dag = match gate {
            OpType::S => OpType::Sdg,
            OpType::Sdg => OpType::S,
            OpType::V => OpType::Vdg,
            OpType::Vdg => OpType::V,
            other => *other,
        };
        let args: Vec<UnitId> = qs.iter().map(|&i| uid(i)).collect();
        circ.add_gate(dag, vec![], &args).map_err(CompileError::Ir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_individual_single_z_rotation() {
        let mut circ = Circuit::with_size(1, 0);
        circ.rz(0.3, 0).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        let out = synthesise_pauli_graph(&pg, SynthStrategy::Individual, CXConfig::Snake).unwrap();
        assert_eq!(out.count_gates(OpType::Rz, false), 1);
        assert_eq!(out.count_gates(OpType::CX, false), 0);
    }

    #[test]
    fn test_individual_zz_rotation_uses_ladder() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().rz(0.5, 1).unwrap().cx(0, 1).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        assert!(pg.clifford().is_identity());
        let out = synthesise_pauli_graph(&pg, SynthStrategy::Individual, CXConfig::Snake).unwrap();
        assert_eq!(out.count_gates(OpType::CX, false), 2);
        assert_eq!(out.count_gates(OpType::Rz, false), 1);
        out.verify_integrity().unwrap();
    }

    #[test]
    fn test_sets_bounds_cx_count_for_commuting_pair() {
        // exp(−iθ₁/2·ZZXX)·exp(−iθ₂/2·ZZII) on 4 qubits: the set
        // strategy shares one diagonalisation and stays within 4 CXs.
        let mut circ = Circuit::with_size(4, 0);
        use alsvid_ir::op::{Op, PauliExpBox};
        use alsvid_types::Pauli::{I, X, Z};
        let args: Vec<UnitId> = (0..4).map(UnitId::default_qubit).collect();
        circ.add_op(
            Op::PauliExpBox(std::sync::Arc::new(PauliExpBox::new(
                vec![Z, Z, X, X],
                0.37,
            ))),
            &args,
            None,
        )
        .unwrap();
        circ.add_op(
            Op::PauliExpBox(std::sync::Arc::new(PauliExpBox::new(
                vec![Z, Z, I, I],
                0.73,
            ))),
            &args[..2].to_vec(),
            None,
        )
        .unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        let sets = pg.commuting_sets();
        assert_eq!(sets.len(), 1);
        let out = synthesise_pauli_graph(&pg, SynthStrategy::Sets, CXConfig::Snake).unwrap();
        // Shared snake over the first three sites, both rotations on the
        // chain, the widest string closed by a controlled phase.
        assert!(out.count_gates(OpType::CX, false) <= 4);
        assert_eq!(out.count_gates(OpType::Rz, false), 2);
        assert_eq!(out.count_gates(OpType::CRz, false), 1);
        out.verify_integrity().unwrap();
    }

    #[test]
    fn test_pairwise_emits_shared_frame() {
        let mut circ = Circuit::with_size(1, 0);
        circ.rz(0.2, 0).unwrap().rx(0.4, 0).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        let out = synthesise_pauli_graph(&pg, SynthStrategy::Pairwise, CXConfig::Snake).unwrap();
        assert_eq!(out.count_gates(OpType::Rz, false), 1);
        assert_eq!(out.count_gates(OpType::Rx, false), 1);
        out.verify_integrity().unwrap();
    }

    #[test]
    fn test_diagonalise_already_diagonal() {
        let q: Vec<UnitId> = (0..2).map(UnitId::default_qubit).collect();
        let t = SpPauliStabiliser::from_pairs([
            (q[0].clone(), alsvid_types::Pauli::Z),
            (q[1].clone(), alsvid_types::Pauli::Z),
        ]);
        let mut rows = vec![PauliRow::from_sparse(&t, &q)];
        let gates = diagonalise_commuting_set(&mut rows, 2).unwrap();
        assert!(gates.is_empty());
        assert!(rows[0].is_diagonal());
    }

    use crate::pauligraph::PauliGraph;
    use alsvid_types::SpPauliStabiliser;

    #[test]
    fn test_diagonalise_mixed_set() {
        // XX and ZZ... anti-commute; use XX and YY which commute.
        let q: Vec<UnitId> = (0..2).map(UnitId::default_qubit).collect();
        use alsvid_types::Pauli::{X, Y};
        let a = SpPauliStabiliser::from_pairs([(q[0].clone(), X), (q[1].clone(), X)]);
        let b = SpPauliStabiliser::from_pairs([(q[0].clone(), Y), (q[1].clone(), Y)]);
        let mut rows = vec![
            PauliRow::from_sparse(&a, &q),
            PauliRow::from_sparse(&b, &q),
        ];
        diagonalise_commuting_set(&mut rows, 2).unwrap();
        assert!(rows.iter().all(PauliRow::is_diagonal));
    }
}
