//! Pauli dependency graphs.
//!
//! A [`PauliGraph`] represents a circuit as a sequence of Pauli
//! exponentials `exp(−i·θ/2·P)` with anti-commutation edges, followed by
//! a trailing Clifford tableau and terminal measurements.

use std::f64::consts::PI;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;

use alsvid_ir::{Circuit, Op, OpType};
use alsvid_types::{Expr, Pauli, QuarterTurns, SpPauliStabiliser, UnitId};

use crate::error::{CompileError, CompileResult};
use crate::tableau::UnitaryTableau;

/// One Pauli exponential: `exp(−i·angle/2·tensor)`.
///
/// The tensor's coefficient is always `+1`; signs picked up during
/// conjugation are folded into the angle.
#[derive(Debug, Clone, PartialEq)]
pub struct PauliRotation {
    /// The Pauli string.
    pub tensor: SpPauliStabiliser,
    /// The rotation angle, in radians.
    pub angle: Expr,
}

/// A DAG of Pauli rotations plus a trailing Clifford and terminal
/// measurements.
#[derive(Debug, Clone)]
pub struct PauliGraph {
    graph: DiGraph<PauliRotation, (), u32>,
    /// The composed Clifford of the source circuit.
    cliff: UnitaryTableau,
    /// Ordered qubits of the source circuit.
    qubits: Vec<UnitId>,
    /// Ordered bits of the source circuit.
    bits: Vec<UnitId>,
    /// Terminal measurements, qubit onto bit.
    measures: Vec<(UnitId, UnitId)>,
    /// Accumulated global phase.
    phase: Expr,
}

impl PauliGraph {
    /// Build a Pauli graph from a circuit.
    ///
    /// Clifford gates fold into the running tableau; rotations are
    /// conjugated backwards through it and inserted with
    /// anti-commutation edges to every earlier rotation they
    /// anti-commute with. Conditionals, resets and boxes other than
    /// `PauliExpBox` are rejected; measurements must be terminal.
    pub fn from_circuit(circ: &Circuit) -> CompileResult<PauliGraph> {
        if !circ.all_wasm_states().is_empty() {
            return Err(CompileError::UnsupportedOp(OpType::WasmOp));
        }
        let qubits = circ.all_qubits();
        let bits = circ.all_bits();
        // rev tracks the inverse of the Clifford prefix, so conjugating
        // a rotation through it pulls the rotation to the circuit start.
        let mut rev = UnitaryTableau::identity(qubits.clone());
        let mut cliff = UnitaryTableau::identity(qubits.clone());
        let mut graph: DiGraph<PauliRotation, (), u32> = DiGraph::default();
        let mut measures: Vec<(UnitId, UnitId)> = Vec::new();
        let mut measured: FxHashSet<UnitId> = FxHashSet::default();
        let mut phase = circ.phase().clone();

        for cmd in circ.commands().map_err(CompileError::Ir)? {
            if cmd.args.iter().any(|a| measured.contains(a)) {
                return Err(CompileError::MidCircuitMeasurement);
            }
            let optype = cmd.op.optype();
            if optype == OpType::Measure {
                measured.insert(cmd.args[0].clone());
                measured.insert(cmd.args[1].clone());
                measures.push((cmd.args[0].clone(), cmd.args[1].clone()));
                continue;
            }
            if optype.is_clifford_gate() {
                let idxs: Vec<usize> = cmd
                    .args
                    .iter()
                    .map(|u| rev.qubit_index(u).expect("command args are circuit qubits"))
                    .collect();
                let dagger = match optype {
                    OpType::S => OpType::Sdg,
                    OpType::Sdg => OpType::S,
                    OpType::V => OpType::Vdg,
                    OpType::Vdg => OpType::V,
                    other => other,
                };
                rev.apply_gate_front(dagger, &idxs)?;
                cliff.apply_gate_end(optype, &idxs)?;
                continue;
            }
            // Rotations and global phases. A command may contribute
            // several commuting rotations (CRz splits into a ZZ and a Z
            // term).
            let rotations: Vec<(Vec<(UnitId, Pauli)>, Expr)> = match (&cmd.op, optype) {
                (Op::Gate { params, .. }, OpType::Rz) => {
                    vec![(vec![(cmd.args[0].clone(), Pauli::Z)], params[0].clone())]
                }
                (Op::Gate { params, .. }, OpType::Rx) => {
                    vec![(vec![(cmd.args[0].clone(), Pauli::X)], params[0].clone())]
                }
                (Op::Gate { params, .. }, OpType::Ry) => {
                    vec![(vec![(cmd.args[0].clone(), Pauli::Y)], params[0].clone())]
                }
                (Op::Gate { .. }, OpType::T) => {
                    phase = phase + Expr::constant(PI / 8.0);
                    vec![(
                        vec![(cmd.args[0].clone(), Pauli::Z)],
                        Expr::constant(PI / 4.0),
                    )]
                }
                (Op::Gate { .. }, OpType::Tdg) => {
                    phase = phase + Expr::constant(-PI / 8.0);
                    vec![(
                        vec![(cmd.args[0].clone(), Pauli::Z)],
                        Expr::constant(-PI / 4.0),
                    )]
                }
                (Op::Gate { params, .. }, OpType::U1) => {
                    phase = phase + params[0].clone() / Expr::constant(2.0);
                    vec![(vec![(cmd.args[0].clone(), Pauli::Z)], params[0].clone())]
                }
                // CRz(θ) = exp(iθ/4·(Z_aZ_b − Z_b)): a ZZ rotation of
                // −θ/2 and a Z rotation of +θ/2 on the target.
                (Op::Gate { params, .. }, OpType::CRz) => {
                    let half = (params[0].clone() / Expr::constant(2.0)).simplify();
                    vec![
                        (
                            vec![
                                (cmd.args[0].clone(), Pauli::Z),
                                (cmd.args[1].clone(), Pauli::Z),
                            ],
                            (-half.clone()).simplify(),
                        ),
                        (vec![(cmd.args[1].clone(), Pauli::Z)], half),
                    ]
                }
                (Op::Gate { params, .. }, OpType::Phase) => {
                    phase = phase + params[0].clone();
                    vec![]
                }
                (Op::Gate { .. }, OpType::Noop) => vec![],
                (Op::PauliExpBox(b), _) => {
                    let sites: Vec<(UnitId, Pauli)> = b
                        .paulis
                        .iter()
                        .zip(&cmd.args)
                        .filter(|(p, _)| **p != Pauli::I)
                        .map(|(p, q)| (q.clone(), *p))
                        .collect();
                    vec![(sites, b.t.clone())]
                }
                _ => return Err(CompileError::UnsupportedOp(optype)),
            };
            for (sites, angle) in rotations {
                if sites.is_empty() {
                    continue;
                }
                let p = SpPauliStabiliser::from_pairs(sites);
                let conj = rev.conjugate(&p);
                Self::insert_rotation(&mut graph, conj, angle)?;
            }
        }

        Ok(PauliGraph {
            graph,
            cliff,
            qubits,
            bits,
            measures,
            phase: phase.simplify(),
        })
    }

    fn insert_rotation(
        graph: &mut DiGraph<PauliRotation, (), u32>,
        conj: SpPauliStabiliser,
        angle: Expr,
    ) -> CompileResult<()> {
        let turns = conj.coeff.turns();
        debug_assert!(turns % 2 == 0, "Hermitian strings conjugate to ±1 signs");
        let angle = if turns == 2 {
            (-angle).simplify()
        } else {
            angle.simplify()
        };
        let mut tensor = conj;
        tensor.coeff = QuarterTurns::new(0);
        let node = graph.add_node(PauliRotation { tensor, angle });
        let earlier: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&v| v != node)
            .filter(|&v| !graph[v].tensor.commutes_with(&graph[node].tensor))
            .collect();
        for v in earlier {
            graph.add_edge(v, node, ());
        }
        Ok(())
    }

    /// Number of Pauli rotations.
    pub fn n_rotations(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of anti-commutation edges.
    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// The rotations in a topological (insertion) order.
    pub fn rotations_in_order(&self) -> Vec<&PauliRotation> {
        self.graph.node_indices().map(|v| &self.graph[v]).collect()
    }

    /// The trailing Clifford tableau.
    pub fn clifford(&self) -> &UnitaryTableau {
        &self.cliff
    }

    /// Ordered qubits of the source circuit.
    pub fn qubits(&self) -> &[UnitId] {
        &self.qubits
    }

    /// Ordered bits of the source circuit.
    pub fn bits(&self) -> &[UnitId] {
        &self.bits
    }

    /// Terminal measurements.
    pub fn measures(&self) -> &[(UnitId, UnitId)] {
        &self.measures
    }

    /// Accumulated global phase.
    pub fn phase(&self) -> &Expr {
        &self.phase
    }

    /// Whether a rotation has any anti-commuting predecessor.
    pub fn has_predecessors(&self, v: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(v, Direction::Incoming)
            .next()
            .is_some()
    }

    /// Greedy partition of the rotations into runs of mutually
    /// commuting gadgets, respecting insertion order.
    pub fn commuting_sets(&self) -> Vec<Vec<&PauliRotation>> {
        let mut sets: Vec<Vec<&PauliRotation>> = Vec::new();
        for v in self.graph.node_indices() {
            let rot = &self.graph[v];
            match sets.last_mut() {
                Some(set) if set.iter().all(|r| r.tensor.commutes_with(&rot.tensor)) => {
                    set.push(rot);
                }
                _ => sets.push(vec![rot]),
            }
        }
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(i: u32) -> UnitId {
        UnitId::default_qubit(i)
    }

    #[test]
    fn test_rz_only_graph() {
        let mut circ = Circuit::with_size(2, 0);
        circ.rz(0.3, 0).unwrap().rz(0.4, 1).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        assert_eq!(pg.n_rotations(), 2);
        assert_eq!(pg.n_edges(), 0);
        assert!(pg.clifford().is_identity());
    }

    #[test]
    fn test_clifford_conjugation_of_rotation() {
        // H then Rz is an X rotation in the Pauli picture.
        let mut circ = Circuit::with_size(1, 0);
        circ.h(0).unwrap().rz(0.3, 0).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        assert_eq!(pg.n_rotations(), 1);
        let rots = pg.rotations_in_order();
        assert_eq!(rots[0].tensor.get(&q(0)), Pauli::X);
        assert!(!pg.clifford().is_identity());
    }

    #[test]
    fn test_cx_conjugation_widens_support() {
        // CX then Rz on the target pulls back to a ZZ rotation.
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().rz(0.5, 1).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        let rots = pg.rotations_in_order();
        assert_eq!(rots[0].tensor.get(&q(0)), Pauli::Z);
        assert_eq!(rots[0].tensor.get(&q(1)), Pauli::Z);
    }

    #[test]
    fn test_anticommutation_edges() {
        let mut circ = Circuit::with_size(1, 0);
        circ.rz(0.1, 0).unwrap().rx(0.2, 0).unwrap().rz(0.3, 0).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        assert_eq!(pg.n_rotations(), 3);
        // Z–X, X–Z anti-commute; the two Z rotations commute.
        assert_eq!(pg.n_edges(), 2);
    }

    #[test]
    fn test_mid_circuit_measurement_rejected() {
        let mut circ = Circuit::with_size(1, 1);
        circ.measure(0, 0).unwrap();
        circ.x(0).unwrap();
        assert!(matches!(
            PauliGraph::from_circuit(&circ),
            Err(CompileError::MidCircuitMeasurement)
        ));
    }

    #[test]
    fn test_terminal_measurement_accepted() {
        let mut circ = Circuit::with_size(1, 1);
        circ.rz(0.2, 0).unwrap();
        circ.measure(0, 0).unwrap();
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        assert_eq!(pg.measures().len(), 1);
    }

    #[test]
    fn test_conditional_rejected() {
        let mut circ = Circuit::with_size(1, 1);
        circ.add_conditional_gate(OpType::X, vec![], &[q(0)], &[UnitId::default_bit(0)], 1)
            .unwrap();
        assert!(matches!(
            PauliGraph::from_circuit(&circ),
            Err(CompileError::UnsupportedOp(OpType::Conditional))
        ));
    }

    #[test]
    fn test_commuting_sets_partition() {
        let mut circ = Circuit::with_size(2, 0);
        circ.rz(0.1, 0).unwrap(); // Z0
        circ.rz(0.2, 1).unwrap(); // Z1, commutes with Z0
        circ.rx(0.3, 0).unwrap(); // X0, anti-commutes with Z0
        let pg = PauliGraph::from_circuit(&circ).unwrap();
        let sets = pg.commuting_sets();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].len(), 2);
        assert_eq!(sets[1].len(), 1);
    }
}
