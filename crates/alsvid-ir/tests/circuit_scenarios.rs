//! End-to-end circuit scenarios and algebraic properties.

use alsvid_ir::{Circuit, OpType};
use alsvid_types::{Expr, UnitId};

#[test]
fn test_empty_circuit() {
    let circ = Circuit::new();
    assert_eq!(circ.depth().unwrap(), 0);
    assert_eq!(circ.n_vertices(), 0);
    assert!(circ.all_qubits().is_empty());
}

#[test]
fn test_cx_chain_slicing() {
    let mut circ = Circuit::with_size(3, 0);
    circ.cx(0, 1).unwrap().cx(1, 2).unwrap();
    let slices: Vec<_> = circ.slices().map(Result::unwrap).collect();
    assert_eq!(slices.iter().filter(|s| !s.is_empty()).count(), 2);
    assert_eq!(circ.depth().unwrap(), 2);
    assert_eq!(circ.depth_by_types(&[OpType::CX]).unwrap(), 2);
}

#[test]
fn test_implicit_permutation_scenario() {
    let mut circ = Circuit::with_size(2, 0);
    circ.swap(0, 1).unwrap();
    circ.replace_swaps().unwrap();

    let perm = circ.implicit_qubit_permutation();
    assert!(perm.contains(&(UnitId::default_qubit(0), UnitId::default_qubit(1))));
    assert!(circ.has_implicit_wireswaps());

    circ.replace_all_implicit_wire_swaps().unwrap();
    assert!(!circ.has_implicit_wireswaps());
    assert_eq!(circ.count_gates(OpType::Swap, false), 1);
}

#[test]
fn test_conditional_wrapping_scenario() {
    let mut circ = Circuit::with_size(1, 2);
    circ.add_conditional_gate(
        OpType::X,
        vec![],
        &[UnitId::default_qubit(0)],
        &[UnitId::default_bit(0), UnitId::default_bit(1)],
        3,
    )
    .unwrap();
    let cmds = circ.commands().unwrap();
    assert_eq!(cmds.len(), 1);
    let cmd = &cmds[0];
    assert_eq!(cmd.op.optype(), OpType::Conditional);
    let alsvid_ir::Op::Conditional(c) = &cmd.op else {
        panic!("expected conditional");
    };
    assert_eq!(c.width, 2);
    assert_eq!(c.value, 3);
    assert_eq!(c.op.optype(), OpType::X);
    assert_eq!(
        cmd.args,
        vec![
            UnitId::default_bit(0),
            UnitId::default_bit(1),
            UnitId::default_qubit(0),
        ]
    );
}

#[test]
fn test_count_gates_additive_under_append() {
    let mut a = Circuit::with_size(2, 0);
    a.h(0).unwrap().cx(0, 1).unwrap();
    let mut b = Circuit::with_size(2, 0);
    b.cx(0, 1).unwrap().cx(1, 0).unwrap();

    let h_a = a.count_gates(OpType::H, false);
    let cx_a = a.count_gates(OpType::CX, false);
    let cx_b = b.count_gates(OpType::CX, false);

    a.append(&b).unwrap();
    assert_eq!(a.count_gates(OpType::H, false), h_a);
    assert_eq!(a.count_gates(OpType::CX, false), cx_a + cx_b);
}

#[test]
fn test_depth_bounded_by_gate_count() {
    let mut chain = Circuit::with_size(1, 0);
    for _ in 0..5 {
        chain.h(0).unwrap();
    }
    // A pure chain meets the bound with equality.
    assert_eq!(chain.depth().unwrap(), 5);
    assert_eq!(chain.n_gates(), 5);

    let mut wide = Circuit::with_size(5, 0);
    for q in 0..5 {
        wide.h(q).unwrap();
    }
    assert!(wide.depth().unwrap() <= wide.n_gates());
    assert_eq!(wide.depth().unwrap(), 1);
}

#[test]
fn test_symbol_substitution_symbol_flow() {
    let mut circ = Circuit::with_size(1, 0);
    circ.rz(Expr::symbol("x"), 0).unwrap();
    // x → 2y introduces y and removes x.
    let mut map = rustc_hash::FxHashMap::default();
    map.insert(
        "x".to_string(),
        Expr::symbol("y") * Expr::constant(2.0),
    );
    circ.symbol_substitution(&map);
    let syms = circ.free_symbols();
    assert!(syms.contains("y"));
    assert!(!syms.contains("x"));
}

#[test]
fn test_dagger_transpose_involutions() {
    let mut circ = Circuit::with_size(2, 0);
    circ.h(0)
        .unwrap()
        .s(1)
        .unwrap()
        .cx(0, 1)
        .unwrap()
        .ry(0.4, 1)
        .unwrap();
    assert_eq!(circ.dagger().unwrap().dagger().unwrap(), circ);
    assert_eq!(
        circ.transpose().unwrap().transpose().unwrap().commands().unwrap(),
        circ.commands().unwrap()
    );
}

#[test]
fn test_barrier_data_survives_dagger() {
    let mut circ = Circuit::with_size(2, 0);
    circ.add_barrier(
        &[UnitId::default_qubit(0), UnitId::default_qubit(1)],
        Some("sync-point".to_string()),
    )
    .unwrap();
    let dag = circ.dagger().unwrap();
    let cmds = dag.commands().unwrap();
    let alsvid_ir::Op::Barrier { data, .. } = &cmds[0].op else {
        panic!("expected barrier");
    };
    assert_eq!(data, "sync-point");
}

#[test]
fn test_json_round_trip_preserves_everything() {
    let mut circ = Circuit::with_size(3, 2);
    circ.set_name("mixed");
    circ.h(0).unwrap();
    circ.add_conditional_gate(
        OpType::Rz,
        vec![Expr::symbol("a")],
        &[UnitId::default_qubit(1)],
        &[UnitId::default_bit(0)],
        1,
    )
    .unwrap();
    circ.swap(1, 2).unwrap();
    circ.replace_swaps().unwrap();
    circ.measure(0, 1).unwrap();
    circ.add_phase(Expr::constant(0.25));

    let json = serde_json::to_value(&circ).unwrap();
    let back: Circuit = serde_json::from_value(json).unwrap();
    assert_eq!(circ, back);
    assert_eq!(
        circ.implicit_qubit_permutation(),
        back.implicit_qubit_permutation()
    );
}

mod random_circuits {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        H(u32),
        S(u32),
        Rz(f64, u32),
        Cx(u32, u32),
    }

    fn step_strategy(n: u32) -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..n).prop_map(Step::H),
            (0..n).prop_map(Step::S),
            (-3.0..3.0f64, 0..n).prop_map(|(a, q)| Step::Rz(a, q)),
            (0..n, 0..n - 1).prop_map(|(a, b)| {
                let b = if b >= a { b + 1 } else { b };
                Step::Cx(a, b)
            }),
        ]
    }

    fn build(steps: &[Step]) -> Circuit {
        let mut circ = Circuit::with_size(4, 0);
        for s in steps {
            match s {
                Step::H(q) => circ.h(*q).unwrap(),
                Step::S(q) => circ.s(*q).unwrap(),
                Step::Rz(a, q) => circ.rz(*a, *q).unwrap(),
                Step::Cx(a, b) => circ.cx(*a, *b).unwrap(),
            };
        }
        circ
    }

    proptest! {
        #[test]
        fn prop_json_round_trip(steps in proptest::collection::vec(step_strategy(4), 0..24)) {
            let circ = build(&steps);
            let json = serde_json::to_value(&circ).unwrap();
            let back: Circuit = serde_json::from_value(json).unwrap();
            prop_assert_eq!(&circ, &back);
        }

        #[test]
        fn prop_dagger_involutive(steps in proptest::collection::vec(step_strategy(4), 0..24)) {
            let circ = build(&steps);
            let dd = circ.dagger().unwrap().dagger().unwrap();
            prop_assert_eq!(&circ, &dd);
        }

        #[test]
        fn prop_depth_bounded(steps in proptest::collection::vec(step_strategy(4), 0..24)) {
            let circ = build(&steps);
            prop_assert!(circ.depth().unwrap() <= circ.n_gates());
        }

        #[test]
        fn prop_integrity_preserved(steps in proptest::collection::vec(step_strategy(4), 0..24)) {
            let circ = build(&steps);
            circ.verify_integrity().unwrap();
        }
    }
}
