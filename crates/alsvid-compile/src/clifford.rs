//! Clifford-circuit rewrites.

use rustc_hash::FxHashMap;

use alsvid_ir::{
    Circuit, GraphRewiring, NodeIndex, Op, OpType, Subcircuit, VertexDeletion, circpool,
};
use alsvid_types::{Expr, Pauli, UnitId};

use crate::error::{CompileError, CompileResult};
use crate::synth::diagonalise_commuting_set;
use crate::tableau::{PauliRow, UnitaryTableau};
use crate::transform::Transform;
use crate::unitary::Unitary2x2;

/// Local Clifford rewrites around CX pairs.
///
/// Cancels pairs of CX gates on the same qubit pair whose intermediate
/// gates commute through (diagonal on the control wire, X-basis on the
/// target wire). With `allow_swaps`, an adjacent opposite-orientation
/// pair collapses to one CX plus an elided SWAP.
pub fn multiq_clifford_replacement(allow_swaps: bool) -> Transform {
    Transform::new("multiq_clifford_replacement", move |circ| {
        let mut changed = false;
        // One candidate per scan; removals invalidate walks.
        loop {
            match find_cx_pair(circ, allow_swaps)? {
                Some(CxPair::SameOrientation(v, w)) => {
                    circ.remove_vertex(v, GraphRewiring::Yes, VertexDeletion::Yes)
                        .map_err(CompileError::Ir)?;
                    circ.remove_vertex(w, GraphRewiring::Yes, VertexDeletion::Yes)
                        .map_err(CompileError::Ir)?;
                    changed = true;
                }
                Some(CxPair::OppositeOrientation(v, w)) => {
                    let sub = Subcircuit {
                        in_edges: vec![
                            circ.in_edge(v, 0).map_err(CompileError::Ir)?,
                            circ.in_edge(v, 1).map_err(CompileError::Ir)?,
                        ],
                        out_edges: vec![
                            circ.out_edge(w, 1).map_err(CompileError::Ir)?,
                            circ.out_edge(w, 0).map_err(CompileError::Ir)?,
                        ],
                        vertices: vec![v, w],
                    };
                    let template = circpool::swap_cx().map_err(CompileError::Ir)?;
                    circ.substitute(&template, &sub).map_err(CompileError::Ir)?;
                    changed = true;
                }
                _ => break,
            }
        }
        if allow_swaps && changed {
            circ.replace_swaps().map_err(CompileError::Ir)?;
        }
        Ok(changed)
    })
}

enum CxPair {
    /// Both CXs oriented identically; intermediates commute through.
    SameOrientation(NodeIndex, NodeIndex),
    /// Directly adjacent, opposite orientation.
    OppositeOrientation(NodeIndex, NodeIndex),
}

/// Walk forward from a CX along one wire until another CX on the same
/// qubit pair; all intermediate vertices must commute with `basis` at
/// the traversed port.
fn walk_to_partner(
    circ: &Circuit,
    v: NodeIndex,
    port: u32,
    basis: Pauli,
) -> CompileResult<Option<(NodeIndex, u32, bool)>> {
    let mut edge = circ.out_edge(v, port).map_err(CompileError::Ir)?;
    let mut clean = true;
    loop {
        let t = circ.target(edge);
        let op = circ.op(t);
        if op.is_boundary() {
            return Ok(None);
        }
        let tgt_port = circ.wire(edge).tgt_port;
        if op.optype() == OpType::CX {
            return Ok(Some((t, tgt_port, clean)));
        }
        if !op.commutes_with_basis(basis, tgt_port as usize) {
            return Ok(None);
        }
        clean = false;
        edge = circ.next_edge(t, edge).map_err(CompileError::Ir)?;
    }
}

fn find_cx_pair(circ: &Circuit, allow_swaps: bool) -> CompileResult<Option<CxPair>> {
    for v in circ.op_vertices() {
        if circ.optype(v) != OpType::CX {
            continue;
        }
        let Some((w0, p0, adj0)) = walk_to_partner(circ, v, 0, Pauli::Z)? else {
            continue;
        };
        let Some((w1, p1, adj1)) = walk_to_partner(circ, v, 1, Pauli::X)? else {
            continue;
        };
        if w0 != w1 || w0 == v {
            continue;
        }
        if p0 == 0 && p1 == 1 {
            return Ok(Some(CxPair::SameOrientation(v, w0)));
        }
        if allow_swaps && p0 == 1 && p1 == 0 && adj0 && adj1 {
            return Ok(Some(CxPair::OppositeOrientation(v, w0)));
        }
    }
    Ok(None)
}

/// Copy Pauli gates backwards through CX gates: `CX; X(control)` becomes
/// `X; X; CX` and `CX; Z(target)` becomes `Z; Z; CX`.
pub fn copy_pi_through_cx() -> Transform {
    Transform::new("copy_pi_through_cx", |circ| {
        let mut changed = false;
        loop {
            let mut found = None;
            'scan: for v in circ.op_vertices() {
                if circ.optype(v) != OpType::CX {
                    continue;
                }
                for (port, pauli, template) in [
                    (0u32, OpType::X, 0u8),
                    (1u32, OpType::Z, 1u8),
                ] {
                    let out = circ.out_edge(v, port).map_err(CompileError::Ir)?;
                    let t = circ.target(out);
                    if circ.optype(t) == pauli {
                        found = Some((v, t, port, template));
                        break 'scan;
                    }
                }
            }
            let Some((cx, pauli_v, port, template)) = found else {
                break;
            };
            // Region: the CX and the trailing Pauli on one of its wires.
            let other = 1 - port;
            let sub = Subcircuit {
                in_edges: vec![
                    circ.in_edge(cx, 0).map_err(CompileError::Ir)?,
                    circ.in_edge(cx, 1).map_err(CompileError::Ir)?,
                ],
                out_edges: if port == 0 {
                    vec![
                        circ.out_edge(pauli_v, 0).map_err(CompileError::Ir)?,
                        circ.out_edge(cx, other).map_err(CompileError::Ir)?,
                    ]
                } else {
                    vec![
                        circ.out_edge(cx, other).map_err(CompileError::Ir)?,
                        circ.out_edge(pauli_v, 0).map_err(CompileError::Ir)?,
                    ]
                },
                vertices: vec![cx, pauli_v],
            };
            let repl = if template == 0 {
                circpool::x1_cx().map_err(CompileError::Ir)?
            } else {
                circpool::z0_cx().map_err(CompileError::Ir)?
            };
            circ.substitute(&repl, &sub).map_err(CompileError::Ir)?;
            changed = true;
        }
        Ok(changed)
    })
}

/// The canonical single-qubit Clifford forms `(Z?, X?, S?, V?, S?)`,
/// keyed by the tableau images of X and Z.
type CliffKey = ((Pauli, bool), (Pauli, bool));

fn singleq_tableau_key(gates: &[OpType]) -> CliffKey {
    let mut tab = UnitaryTableau::identity(vec![UnitId::default_qubit(0)]);
    for g in gates {
        tab.apply_gate_end(*g, &[0]).expect("gate set is Clifford");
    }
    (
        (tab.xrow(0).pauli(0), tab.xrow(0).sign),
        (tab.zrow(0).pauli(0), tab.zrow(0).sign),
    )
}

fn canonical_forms() -> FxHashMap<CliffKey, Vec<OpType>> {
    let mut table: FxHashMap<CliffKey, Vec<OpType>> = FxHashMap::default();
    for bits in 0..32u32 {
        let mut gates = Vec::new();
        if bits & 1 != 0 {
            gates.push(OpType::Z);
        }
        if bits & 2 != 0 {
            gates.push(OpType::X);
        }
        if bits & 4 != 0 {
            gates.push(OpType::S);
        }
        if bits & 8 != 0 {
            gates.push(OpType::V);
        }
        if bits & 16 != 0 {
            gates.push(OpType::S);
        }
        let key = singleq_tableau_key(&gates);
        let replace = match table.get(&key) {
            Some(existing) => existing.len() > gates.len(),
            None => true,
        };
        if replace {
            table.insert(key, gates);
        }
    }
    table
}

const SINGLEQ_CLIFFORDS: [OpType; 8] = [
    OpType::X,
    OpType::Y,
    OpType::Z,
    OpType::H,
    OpType::S,
    OpType::Sdg,
    OpType::V,
    OpType::Vdg,
];

/// Rewrite every maximal single-qubit Clifford segment into the
/// canonical form `(Z?, X?, S?, V?, S?)`, fixing the global phase
/// numerically.
pub fn singleq_clifford_sweep() -> Transform {
    Transform::new("singleq_clifford_sweep", |circ| {
        let table = canonical_forms();
        let mut changed = false;
        loop {
            // Find one non-canonical run per scan.
            let mut target_run: Option<Vec<NodeIndex>> = None;
            'outer: for qubit in circ.all_qubits() {
                let input = circ.get_in(&qubit).map_err(CompileError::Ir)?;
                let mut edge = circ.out_edge(input, 0).map_err(CompileError::Ir)?;
                let mut run: Vec<NodeIndex> = Vec::new();
                loop {
                    let v = circ.target(edge);
                    let at_end = circ.op(v).is_boundary();
                    if !at_end && SINGLEQ_CLIFFORDS.contains(&circ.optype(v)) {
                        run.push(v);
                    } else {
                        if !is_canonical(circ, &run, &table) {
                            target_run = Some(run);
                            break 'outer;
                        }
                        run.clear();
                    }
                    if at_end {
                        break;
                    }
                    edge = circ.next_edge(v, edge).map_err(CompileError::Ir)?;
                }
            }
            let Some(run) = target_run else {
                break;
            };
            let key = singleq_run_key(circ, &run);
            let canonical = table
                .get(&key)
                .expect("all 24 single-qubit Cliffords have canonical forms")
                .clone();
            // Phase correction between the old segment and its canonical
            // form.
            let old_u = run.iter().fold(Unitary2x2::identity(), |acc, &v| {
                Unitary2x2::from_gate(circ.op(v))
                    .expect("run is a single-qubit gate segment")
                    .matmul(&acc)
            });
            let new_u = canonical.iter().fold(Unitary2x2::identity(), |acc, &g| {
                Unitary2x2::from_gate(&Op::simple_gate(g))
                    .expect("canonical form is a gate list")
                    .matmul(&acc)
            });
            let phase = old_u
                .phase_relative_to(&new_u)
                .expect("tableau-equal Cliffords differ by a global phase");

            let first = run[0];
            let last = *run.last().expect("run is non-empty");
            let sub = Subcircuit {
                in_edges: vec![circ.in_edge(first, 0).map_err(CompileError::Ir)?],
                out_edges: vec![circ.out_edge(last, 0).map_err(CompileError::Ir)?],
                vertices: run,
            };
            let mut repl = Circuit::with_size(1, 0);
            for g in canonical {
                repl.add_gate(g, vec![], &[UnitId::default_qubit(0)])
                    .map_err(CompileError::Ir)?;
            }
            circ.substitute(&repl, &sub).map_err(CompileError::Ir)?;
            if phase.abs() > crate::unitary::EPSILON {
                circ.add_phase(Expr::constant(phase));
            }
            changed = true;
        }
        Ok(changed)
    })
}

fn singleq_run_key(circ: &Circuit, run: &[NodeIndex]) -> CliffKey {
    let gates: Vec<OpType> = run.iter().map(|&v| circ.optype(v)).collect();
    singleq_tableau_key(&gates)
}

fn is_canonical(
    circ: &Circuit,
    run: &[NodeIndex],
    table: &FxHashMap<CliffKey, Vec<OpType>>,
) -> bool {
    if run.is_empty() {
        return true;
    }
    let gates: Vec<OpType> = run.iter().map(|&v| circ.optype(v)).collect();
    table
        .get(&singleq_run_key(circ, run))
        .is_some_and(|canonical| *canonical == gates)
}

/// Push a terminal Clifford suffix past the measurement boundary when
/// mutual diagonalisation of the measured observables costs fewer CX
/// gates. Outcome flips from negative observables become classical NOT
/// corrections on the measured bits.
pub fn push_cliffords_through_measures() -> Transform {
    Transform::new("push_cliffords_through_measures", |circ| {
        if circ.has_implicit_wireswaps() {
            return Ok(false);
        }
        let commands = circ.commands().map_err(CompileError::Ir)?;
        // Split: prefix | Clifford suffix | terminal measures.
        let n = commands.len();
        let mut m_start = n;
        while m_start > 0 && commands[m_start - 1].op.optype() == OpType::Measure {
            m_start -= 1;
        }
        if m_start == n {
            return Ok(false);
        }
        let mut c_start = m_start;
        while c_start > 0 && commands[c_start - 1].op.is_clifford() {
            c_start -= 1;
        }
        if c_start == m_start {
            return Ok(false);
        }

        let qubits = circ.all_qubits();
        let mut rev = UnitaryTableau::identity(qubits.clone());
        let mut old_cx = 0usize;
        for cmd in &commands[c_start..m_start] {
            let idxs: Vec<usize> = cmd
                .args
                .iter()
                .filter_map(|u| rev.qubit_index(u))
                .collect();
            let optype = cmd.op.optype();
            if cmd.op.n_qubits() == 2 {
                old_cx += 1;
            }
            let dagger = match optype {
                OpType::S => OpType::Sdg,
                OpType::Sdg => OpType::S,
                OpType::V => OpType::Vdg,
                OpType::Vdg => OpType::V,
                other => other,
            };
            rev.apply_gate_front(dagger, &idxs)?;
        }

        // Pulled-back observables for each measured qubit.
        let measures: Vec<(UnitId, UnitId)> = commands[m_start..]
            .iter()
            .map(|cmd| (cmd.args[0].clone(), cmd.args[1].clone()))
            .collect();
        let mut rows: Vec<PauliRow> = measures
            .iter()
            .map(|(q, _)| {
                let z = alsvid_types::SpPauliStabiliser::from_pairs([(q.clone(), Pauli::Z)]);
                PauliRow::from_sparse(&rev.conjugate(&z), &qubits)
            })
            .collect();
        let frame = diagonalise_commuting_set(&mut rows, qubits.len())?;

        let frame_cx = frame
            .iter()
            .filter(|(g, _)| matches!(g, OpType::CX | OpType::CZ))
            .count();
        let parity_cx: usize = rows
            .iter()
            .map(|r| r.support().len().saturating_sub(1))
            .sum();
        if frame_cx + parity_cx >= old_cx {
            return Ok(false);
        }

        // Rebuild: prefix, diagonalising frame, parity fan-ins, measures
        // and classical sign fixes.
        let mut out = Circuit::new();
        for u in circ.all_units() {
            out.add_unit_any(u.clone()).map_err(CompileError::Ir)?;
        }
        for cmd in &commands[..c_start] {
            out.add_op(cmd.op.clone(), &cmd.args, cmd.opgroup.clone())
                .map_err(CompileError::Ir)?;
        }
        for (gate, qs) in &frame {
            let args: Vec<UnitId> = qs.iter().map(|&i| qubits[i].clone()).collect();
            out.add_gate(*gate, vec![], &args).map_err(CompileError::Ir)?;
        }
        for ((_, bit), row) in measures.iter().zip(&rows) {
            let support = row.support();
            if support.is_empty() {
                // Constant observable: measure anyway on the original
                // wire position (weight-0 rows should not arise from
                // unitary suffixes).
                continue;
            }
            let target = *support.last().expect("support checked non-empty");
            for &s in &support[..support.len() - 1] {
                out.add_gate(
                    OpType::CX,
                    vec![],
                    &[qubits[s].clone(), qubits[target].clone()],
                )
                .map_err(CompileError::Ir)?;
            }
            out.add_measure(qubits[target].clone(), bit.clone())
                .map_err(CompileError::Ir)?;
            for &s in support[..support.len() - 1].iter().rev() {
                out.add_gate(
                    OpType::CX,
                    vec![],
                    &[qubits[s].clone(), qubits[target].clone()],
                )
                .map_err(CompileError::Ir)?;
            }
            if row.sign {
                out.add_op(
                    Op::Classical(alsvid_ir::op::classical::classical_x()),
                    &[bit.clone()],
                    None,
                )
                .map_err(CompileError::Ir)?;
            }
        }
        out.add_phase(circ.phase().clone());
        *circ = out;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_cx_pair_cancels() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().cx(0, 1).unwrap();
        let t = multiq_clifford_replacement(false);
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 0);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_cx_pair_with_commuting_intermediates() {
        // Rz on the control and Rx on the target commute through.
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1)
            .unwrap()
            .rz(0.3, 0)
            .unwrap()
            .rx(0.4, 1)
            .unwrap()
            .cx(0, 1)
            .unwrap();
        let t = multiq_clifford_replacement(false);
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 0);
        assert_eq!(circ.count_gates(OpType::Rz, false), 1);
        assert_eq!(circ.count_gates(OpType::Rx, false), 1);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_cx_pair_blocked_by_noncommuting_gate() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().h(0).unwrap().cx(0, 1).unwrap();
        let t = multiq_clifford_replacement(false);
        assert!(!t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 2);
    }

    #[test]
    fn test_opposite_pair_with_swaps() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().cx(1, 0).unwrap();
        let t = multiq_clifford_replacement(true);
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 1);
        assert!(circ.has_implicit_wireswaps());
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_copy_x_through_cx() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().x(0).unwrap();
        let t = copy_pi_through_cx();
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::X, false), 2);
        assert_eq!(circ.count_gates(OpType::CX, false), 1);
        // The X gates now precede the CX.
        let cmds = circ.commands().unwrap();
        assert_eq!(cmds.last().unwrap().op.optype(), OpType::CX);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_copy_z_through_cx() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().z(1).unwrap();
        let t = copy_pi_through_cx();
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::Z, false), 2);
        let cmds = circ.commands().unwrap();
        assert_eq!(cmds.last().unwrap().op.optype(), OpType::CX);
    }

    #[test]
    fn test_singleq_sweep_canonicalises_hh() {
        let mut circ = Circuit::with_size(1, 0);
        circ.h(0).unwrap().h(0).unwrap();
        let t = singleq_clifford_sweep();
        assert!(t.apply(&mut circ).unwrap());
        // H·H is the identity Clifford: canonical form is empty.
        assert_eq!(circ.n_gates(), 0);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_singleq_sweep_leaves_canonical_runs() {
        let mut circ = Circuit::with_size(1, 0);
        circ.s(0).unwrap();
        let t = singleq_clifford_sweep();
        assert!(!t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::S, false), 1);
    }

    #[test]
    fn test_singleq_sweep_known_identity() {
        // S S = Z in canonical form.
        let mut circ = Circuit::with_size(1, 0);
        circ.s(0).unwrap().s(0).unwrap();
        let t = singleq_clifford_sweep();
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::Z, false), 1);
        assert_eq!(circ.n_gates(), 1);
    }

    #[test]
    fn test_push_cliffords_through_measures() {
        // CX before two measures re-expresses one observable as a
        // parity; the rebuilt circuit keeps measuring both bits.
        let mut circ = Circuit::with_size(2, 2);
        circ.rz(0.7, 0).unwrap();
        circ.cx(0, 1).unwrap();
        circ.measure(0, 0).unwrap();
        circ.measure(1, 1).unwrap();
        let before_cx = circ.count_gates(OpType::CX, false);
        let t = push_cliffords_through_measures();
        let changed = t.apply(&mut circ).unwrap();
        circ.verify_integrity().unwrap();
        assert_eq!(circ.count_gates(OpType::Measure, false), 2);
        if changed {
            assert!(circ.count_gates(OpType::CX, false) <= before_cx);
        }
    }
}
