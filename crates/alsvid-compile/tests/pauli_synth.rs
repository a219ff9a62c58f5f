//! Pauli-graph resynthesis checked against the statevector oracle.

mod common;

use std::sync::Arc;

use alsvid_compile::{CXConfig, PauliGraph, SynthStrategy, synthesise_pauli_graph};
use alsvid_ir::op::PauliExpBox;
use alsvid_ir::{Circuit, Op};
use alsvid_types::Pauli::{I, X, Y, Z};
use alsvid_types::UnitId;

use common::{EPS, unitary_equiv};

fn resynth_all_strategies(circ: &Circuit) {
    let pg = PauliGraph::from_circuit(circ).unwrap();
    for strategy in [
        SynthStrategy::Individual,
        SynthStrategy::Pairwise,
        SynthStrategy::Sets,
    ] {
        for config in [
            CXConfig::Snake,
            CXConfig::Star,
            CXConfig::Tree,
            CXConfig::MultiQGate,
        ] {
            let out = synthesise_pauli_graph(&pg, strategy, config).unwrap();
            out.verify_integrity().unwrap();
            assert!(
                unitary_equiv(circ, &out, EPS),
                "resynthesis diverged for {strategy:?}/{config:?}"
            );
        }
    }
}

#[test]
fn test_rotation_chain_resynthesis() {
    let mut circ = Circuit::with_size(2, 0);
    circ.rz(0.31, 0)
        .unwrap()
        .rx(0.47, 0)
        .unwrap()
        .rz(-0.9, 1)
        .unwrap();
    resynth_all_strategies(&circ);
}

#[test]
fn test_clifford_plus_rotations_resynthesis() {
    let mut circ = Circuit::with_size(3, 0);
    circ.h(0)
        .unwrap()
        .cx(0, 1)
        .unwrap()
        .rz(0.2, 1)
        .unwrap()
        .s(2)
        .unwrap()
        .cx(1, 2)
        .unwrap()
        .ry(1.1, 2)
        .unwrap()
        .v(0)
        .unwrap();
    resynth_all_strategies(&circ);
}

#[test]
fn test_t_gates_resynthesis_tracks_phase() {
    let mut circ = Circuit::with_size(2, 0);
    circ.t(0).unwrap().h(0).unwrap().t(0).unwrap().cx(0, 1).unwrap();
    resynth_all_strategies(&circ);
}

#[test]
fn test_commuting_set_scenario() {
    // exp(−iθ₁/2·ZZXX) · exp(−iθ₂/2·ZZII) on 4 qubits.
    let mut circ = Circuit::with_size(4, 0);
    let args: Vec<UnitId> = (0..4).map(UnitId::default_qubit).collect();
    circ.add_op(
        Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![Z, Z, X, X], 0.37))),
        &args,
        None,
    )
    .unwrap();
    circ.add_op(
        Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![Z, Z], 0.73))),
        &args[..2],
        None,
    )
    .unwrap();
    let pg = PauliGraph::from_circuit(&circ).unwrap();
    let out = synthesise_pauli_graph(&pg, SynthStrategy::Sets, CXConfig::Snake).unwrap();
    assert!(unitary_equiv(&circ, &out, EPS));
    assert!(out.count_gates(alsvid_ir::OpType::CX, false) <= 4);
}

#[test]
fn test_anticommuting_pair_template() {
    let mut circ = Circuit::with_size(3, 0);
    let args: Vec<UnitId> = (0..3).map(UnitId::default_qubit).collect();
    circ.add_op(
        Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![Z, Y, I], 0.21))),
        &args,
        None,
    )
    .unwrap();
    circ.add_op(
        Op::PauliExpBox(Arc::new(PauliExpBox::new(vec![X, Y, Z], -0.64))),
        &args,
        None,
    )
    .unwrap();
    resynth_all_strategies(&circ);
}

#[test]
fn test_terminal_measures_survive_resynthesis() {
    let mut circ = Circuit::with_size(2, 2);
    circ.h(0).unwrap().cx(0, 1).unwrap().rz(0.5, 1).unwrap();
    circ.measure(0, 0).unwrap();
    circ.measure(1, 1).unwrap();
    let pg = PauliGraph::from_circuit(&circ).unwrap();
    let out = synthesise_pauli_graph(&pg, SynthStrategy::Individual, CXConfig::Snake).unwrap();
    assert_eq!(out.count_gates(alsvid_ir::OpType::Measure, false), 2);
    out.verify_integrity().unwrap();
}
