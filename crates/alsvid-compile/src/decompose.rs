//! Lowering of box operations to primitive gates.

use num_complex::Complex64;
use rustc_hash::FxHashMap;

use alsvid_ir::op::{MultiplexorBox, QControlBox, UnitaryBox};
use alsvid_ir::{Circuit, Op, OpType};
use alsvid_types::{Expr, Pauli, QuarterTurns, SpPauliStabiliser, UnitId};

use crate::error::{CompileError, CompileResult};
use crate::pauligraph::PauliRotation;
use crate::synth::{CXConfig, append_commuting_set, append_gadget, append_pair};
use crate::transform::Transform;
use crate::unitary::{EPSILON, Unitary2x2};

const BOX_TYPES: [OpType; 12] = [
    OpType::CircBox,
    OpType::CustomGate,
    OpType::Unitary1qBox,
    OpType::ExpBox,
    OpType::PauliExpBox,
    OpType::PauliExpPairBox,
    OpType::PauliExpCommutingSetBox,
    OpType::QControlBox,
    OpType::MultiplexorBox,
    OpType::MultiplexedRotationBox,
    OpType::MultiplexedU2Box,
    OpType::MultiplexedTensoredU2Box,
];

/// Decompose box operations into primitive gates.
///
/// One level per application: nested boxes (a `CircBox` inside a
/// `QControlBox`, say) lower fully under
/// [`Transform::repeat`]. Boxes with no primitive lowering
/// (`Unitary2qBox`, `Unitary3qBox`, multi-qubit `ExpBox`) are left in
/// place.
pub fn decompose_boxes() -> Transform {
    Transform::new("decompose_boxes", |circ| {
        let mut changed = false;
        let candidates: Vec<_> = circ
            .op_vertices()
            .into_iter()
            .filter(|&v| BOX_TYPES.contains(&circ.optype(v)))
            .collect();
        for v in candidates {
            let Some(replacement) = box_replacement(circ.op(v))? else {
                continue;
            };
            let sub = circ.singleton_subcircuit(v).map_err(CompileError::Ir)?;
            circ.substitute(&replacement, &sub)
                .map_err(CompileError::Ir)?;
            changed = true;
        }
        Ok(changed)
    })
}

fn default_qubits(n: usize) -> Vec<UnitId> {
    (0..n as u32).map(UnitId::default_qubit).collect()
}

fn rotation_from_dense(paulis: &[Pauli], angle: Expr) -> PauliRotation {
    let mut tensor = SpPauliStabiliser::from_pairs(
        paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != Pauli::I)
            .map(|(i, p)| (UnitId::default_qubit(i as u32), *p)),
    );
    tensor.coeff = QuarterTurns::new(0);
    PauliRotation { tensor, angle }
}

/// The one-level replacement circuit for a box op, if it has one.
fn box_replacement(op: &Op) -> CompileResult<Option<Circuit>> {
    Ok(match op {
        Op::CircBox(b) => Some(relabel_to_defaults(&b.circuit)?),
        Op::CustomGate(g) => {
            let mut map = FxHashMap::default();
            for (name, arg) in g.def.params.iter().zip(&g.args) {
                map.insert(name.clone(), arg.clone());
            }
            let mut inner = g.def.definition.clone();
            inner.symbol_substitution(&map);
            Some(relabel_to_defaults(&inner)?)
        }
        Op::PauliExpBox(b) => {
            let n = b.paulis.len();
            let qubits = default_qubits(n);
            let mut circ = Circuit::with_size(n as u32, 0);
            let rot = rotation_from_dense(&b.paulis, b.t.clone());
            append_gadget(&mut circ, &qubits, &rot, CXConfig::Snake)
                .map_err(CompileError::Ir)?;
            Some(circ)
        }
        Op::PauliExpPairBox(b) => {
            let n = b.paulis0.len().max(b.paulis1.len());
            let qubits = default_qubits(n);
            let mut circ = Circuit::with_size(n as u32, 0);
            let r0 = rotation_from_dense(&b.paulis0, b.t0.clone());
            let r1 = rotation_from_dense(&b.paulis1, b.t1.clone());
            if r0.tensor.commutes_with(&r1.tensor) {
                append_gadget(&mut circ, &qubits, &r0, CXConfig::Snake)
                    .map_err(CompileError::Ir)?;
                append_gadget(&mut circ, &qubits, &r1, CXConfig::Snake)
                    .map_err(CompileError::Ir)?;
            } else {
                append_pair(&mut circ, &qubits, &r0, &r1)?;
            }
            Some(circ)
        }
        Op::PauliExpCommutingSetBox(b) => {
            if !b.is_commuting() {
                return Err(CompileError::UnsupportedOp(OpType::PauliExpCommutingSetBox));
            }
            let n = b
                .gadgets
                .iter()
                .map(|(p, _)| p.len())
                .max()
                .unwrap_or(0);
            let qubits = default_qubits(n);
            let mut circ = Circuit::with_size(n as u32, 0);
            let rots: Vec<PauliRotation> = b
                .gadgets
                .iter()
                .map(|(p, t)| rotation_from_dense(p, t.clone()))
                .collect();
            let refs: Vec<&PauliRotation> = rots.iter().collect();
            append_commuting_set(&mut circ, &qubits, &refs, CXConfig::Snake)?;
            Some(circ)
        }
        Op::QControlBox(b) => controlled_circuit(&b.op, b.n_controls)?,
        Op::Unitary1qBox(b) => Some(zyz_circuit(&unitary_from_box(b))),
        Op::ExpBox(b) if b.n_qubits == 1 => {
            let u = exp_hermitian_2x2(&b.hermitian, b.t);
            Some(zyz_circuit(&u))
        }
        Op::MultiplexedRotationBox(b) => {
            Some(multiplexed_rotation_circuit(b.axis, &b.angles)?)
        }
        Op::MultiplexorBox(b) | Op::MultiplexedU2Box(b) => Some(demultiplex(b)?),
        Op::MultiplexedTensoredU2Box(b) => {
            let n_controls = b.n_controls as usize;
            let n_targets = b.n_targets() as usize;
            let mut circ = Circuit::with_size((n_controls + n_targets) as u32, 0);
            for (sel, ops) in &b.branches {
                for (t, op) in ops.iter().enumerate() {
                    add_selected_control(
                        &mut circ,
                        *sel,
                        n_controls,
                        op.clone(),
                        &[UnitId::default_qubit((n_controls + t) as u32)],
                    )?;
                }
            }
            Some(circ)
        }
        _ => None,
    })
}

/// Rebuild a circuit over default registers, preserving unit order.
fn relabel_to_defaults(inner: &Circuit) -> CompileResult<Circuit> {
    if !inner.all_wasm_states().is_empty() {
        return Err(CompileError::UnsupportedOp(OpType::CircBox));
    }
    let qubits = inner.all_qubits();
    let bits = inner.all_bits();
    let mut out = Circuit::with_size(qubits.len() as u32, bits.len() as u32);
    let mut map = FxHashMap::default();
    for (i, q) in qubits.iter().enumerate() {
        map.insert(q.clone(), UnitId::default_qubit(i as u32));
    }
    for (i, b) in bits.iter().enumerate() {
        map.insert(b.clone(), UnitId::default_bit(i as u32));
    }
    out.append_with_map(inner, &map).map_err(CompileError::Ir)?;
    Ok(out)
}

fn unitary_from_box(b: &UnitaryBox) -> Unitary2x2 {
    Unitary2x2::new(b.matrix[0], b.matrix[1], b.matrix[2], b.matrix[3])
}

/// `exp(i·A·t)` for Hermitian 2×2 `A`, in closed form.
fn exp_hermitian_2x2(a: &[Complex64], t: f64) -> Unitary2x2 {
    let trace_half = (a[0] + a[3]) / 2.0;
    debug_assert!(trace_half.im.abs() < EPSILON);
    let w = (a[0] - a[3]) / 2.0;
    let v = a[1];
    let r = (w.norm_sqr() + v.norm_sqr()).sqrt();
    let phase = Complex64::from_polar(1.0, trace_half.re * t);
    if r < EPSILON {
        return Unitary2x2::new(
            phase,
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            phase,
        );
    }
    let (c, s) = ((r * t).cos(), (r * t).sin());
    let i = Complex64::new(0.0, 1.0);
    Unitary2x2::new(
        phase * (c + i * s * w / r),
        phase * (i * s * v / r),
        phase * (i * s * v.conj() / r),
        phase * (c - i * s * w / r),
    )
}

/// `Rz(δ); Ry(γ); Rz(β)` plus a global phase, realising a 2×2 unitary.
fn zyz_circuit(u: &Unitary2x2) -> Circuit {
    let (alpha, beta, gamma, delta) = u.zyz_decomposition();
    let mut circ = Circuit::with_size(1, 0);
    let mut gate = |g: OpType, angle: f64, circ: &mut Circuit| {
        if angle.abs() > EPSILON {
            circ.add_gate(g, vec![Expr::constant(angle)], &[UnitId::default_qubit(0)])
                .expect("single-qubit rotation on a fresh wire");
        }
    };
    gate(OpType::Rz, delta, &mut circ);
    gate(OpType::Ry, gamma, &mut circ);
    gate(OpType::Rz, beta, &mut circ);
    if alpha.abs() > EPSILON {
        circ.add_phase(Expr::constant(alpha));
    }
    circ
}

/// A controlled version of a primitive, as a circuit over
/// `n_controls + inner` qubits. `None` when no lowering exists.
fn controlled_circuit(inner: &Op, n_controls: u32) -> CompileResult<Option<Circuit>> {
    if n_controls == 0 {
        if inner.n_qubits() == 1 {
            let mut circ = Circuit::with_size(1, 0);
            circ.add_op(inner.clone(), &[UnitId::default_qubit(0)], None)
                .map_err(CompileError::Ir)?;
            return Ok(Some(circ));
        }
        return Ok(None);
    }
    // Special cases with primitive controlled forms.
    if let Op::Gate { gate, .. } = inner {
        match (gate, n_controls) {
            (OpType::X, 1) => {
                let mut circ = Circuit::with_size(2, 0);
                circ.cx(0, 1).map_err(CompileError::Ir)?;
                return Ok(Some(circ));
            }
            (OpType::X, 2) => {
                let mut circ = Circuit::with_size(3, 0);
                circ.add_gate(OpType::CCX, vec![], &default_qubits(3))
                    .map_err(CompileError::Ir)?;
                return Ok(Some(circ));
            }
            (OpType::Z, 1) => {
                let mut circ = Circuit::with_size(2, 0);
                circ.cz(0, 1).map_err(CompileError::Ir)?;
                return Ok(Some(circ));
            }
            (OpType::CX, 1) => {
                let mut circ = Circuit::with_size(3, 0);
                circ.add_gate(OpType::CCX, vec![], &default_qubits(3))
                    .map_err(CompileError::Ir)?;
                return Ok(Some(circ));
            }
            _ => {}
        }
    }
    // General path requires a numeric 2×2 matrix for the target.
    let u = match inner {
        Op::Unitary1qBox(b) => Some(unitary_from_box(b)),
        op => Unitary2x2::from_gate(op),
    };
    let Some(u) = u else {
        return Ok(None);
    };
    if n_controls == 1 {
        return Ok(Some(controlled_1q(&u)?));
    }
    // C^n(U) = CV on the last control, C^{n−1}X cascades and C^{n−1}(V)
    // with V² = U.
    let v = u.sqrt();
    let n = n_controls as usize;
    let mut circ = Circuit::with_size((n + 1) as u32, 0);
    let last = (n - 1) as u32;
    let target = n as u32;

    let cv = controlled_1q(&v)?;
    circ.append_qubits(&cv, &[last, target])
        .map_err(CompileError::Ir)?;
    add_multi_controlled_x(&mut circ, n - 1, last)?;
    let cvdg = controlled_1q(&v.dagger())?;
    circ.append_qubits(&cvdg, &[last, target])
        .map_err(CompileError::Ir)?;
    add_multi_controlled_x(&mut circ, n - 1, last)?;
    let rest = controlled_circuit(
        &Op::Unitary1qBox(std::sync::Arc::new(UnitaryBox::new(
            1,
            vec![v.data[0], v.data[1], v.data[2], v.data[3]],
        ))),
        n_controls - 1,
    )?
    .expect("matrix targets always lower");
    let mut wires: Vec<u32> = (0..last).collect();
    wires.push(target);
    circ.append_qubits(&rest, &wires).map_err(CompileError::Ir)?;
    Ok(Some(circ))
}

/// Append a multi-controlled X on controls `0..n_controls` and target
/// `target`, one level deep (leaves a `QControlBox` for n > 2).
fn add_multi_controlled_x(
    circ: &mut Circuit,
    n_controls: usize,
    target: u32,
) -> CompileResult<()> {
    let mut args = default_qubits(n_controls);
    args.push(UnitId::default_qubit(target));
    match n_controls {
        0 => {
            circ.add_gate(OpType::X, vec![], &args)
                .map_err(CompileError::Ir)?;
        }
        1 => {
            circ.add_gate(OpType::CX, vec![], &args)
                .map_err(CompileError::Ir)?;
        }
        2 => {
            circ.add_gate(OpType::CCX, vec![], &args)
                .map_err(CompileError::Ir)?;
        }
        n => {
            let b = QControlBox {
                op: Op::simple_gate(OpType::X),
                n_controls: n as u32,
            };
            circ.add_op(Op::QControlBox(std::sync::Arc::new(b)), &args, None)
                .map_err(CompileError::Ir)?;
        }
    }
    Ok(())
}

/// Singly controlled 1-qubit unitary via the ABC decomposition:
/// `U = e^{iα}·Rz(β)·Ry(γ)·Rz(δ)`, `C-U = U1(α)⊗I · A·CX·B·CX·C`.
fn controlled_1q(u: &Unitary2x2) -> CompileResult<Circuit> {
    let (alpha, beta, gamma, delta) = u.zyz_decomposition();
    let mut circ = Circuit::with_size(2, 0);
    let t = UnitId::default_qubit(1);
    let mut gate = |g: OpType, angle: f64, circ: &mut Circuit| -> CompileResult<()> {
        if angle.abs() > EPSILON {
            circ.add_gate(g, vec![Expr::constant(angle)], &[t.clone()])
                .map_err(CompileError::Ir)?;
        }
        Ok(())
    };
    // C = Rz((δ−β)/2)
    gate(OpType::Rz, (delta - beta) / 2.0, &mut circ)?;
    circ.cx(0, 1).map_err(CompileError::Ir)?;
    // B = Ry(−γ/2)·Rz(−(δ+β)/2)
    gate(OpType::Rz, -(delta + beta) / 2.0, &mut circ)?;
    gate(OpType::Ry, -gamma / 2.0, &mut circ)?;
    circ.cx(0, 1).map_err(CompileError::Ir)?;
    // A = Rz(β)·Ry(γ/2)
    gate(OpType::Ry, gamma / 2.0, &mut circ)?;
    gate(OpType::Rz, beta, &mut circ)?;
    if alpha.abs() > EPSILON {
        circ.add_gate(
            OpType::U1,
            vec![Expr::constant(alpha)],
            &[UnitId::default_qubit(0)],
        )
        .map_err(CompileError::Ir)?;
    }
    Ok(circ)
}

/// Uniformly controlled rotation via the recursive halving scheme:
/// each level splits into sum and difference angles around a CX.
fn multiplexed_rotation_circuit(axis: OpType, angles: &[Expr]) -> CompileResult<Circuit> {
    debug_assert!(angles.len().is_power_of_two());
    let k = angles.len().trailing_zeros() as usize;
    let n = (k + 1) as u32;
    let mut circ = Circuit::with_size(n, 0);
    let target = k as u32;
    if axis == OpType::Rx {
        circ.h(target).map_err(CompileError::Ir)?;
    }
    let inner_axis = if axis == OpType::Rx { OpType::Rz } else { axis };
    ucr_recurse(&mut circ, inner_axis, angles, &(0..k as u32).collect::<Vec<_>>(), target)?;
    if axis == OpType::Rx {
        circ.h(target).map_err(CompileError::Ir)?;
    }
    Ok(circ)
}

fn ucr_recurse(
    circ: &mut Circuit,
    axis: OpType,
    angles: &[Expr],
    controls: &[u32],
    target: u32,
) -> CompileResult<()> {
    if controls.is_empty() {
        circ.add_gate(axis, vec![angles[0].clone()], &[UnitId::default_qubit(target)])
            .map_err(CompileError::Ir)?;
        return Ok(());
    }
    let half = angles.len() / 2;
    let top = *controls.last().expect("non-empty control list");
    let rest = &controls[..controls.len() - 1];
    let two = Expr::constant(2.0);
    let sums: Vec<Expr> = (0..half)
        .map(|i| ((angles[i].clone() + angles[i + half].clone()) / two.clone()).simplify())
        .collect();
    let diffs: Vec<Expr> = (0..half)
        .map(|i| ((angles[i].clone() - angles[i + half].clone()) / two.clone()).simplify())
        .collect();
    ucr_recurse(circ, axis, &sums, rest, target)?;
    circ.add_gate(
        OpType::CX,
        vec![],
        &[UnitId::default_qubit(top), UnitId::default_qubit(target)],
    )
    .map_err(CompileError::Ir)?;
    ucr_recurse(circ, axis, &diffs, rest, target)?;
    circ.add_gate(
        OpType::CX,
        vec![],
        &[UnitId::default_qubit(top), UnitId::default_qubit(target)],
    )
    .map_err(CompileError::Ir)?;
    Ok(())
}

/// Demultiplex: each branch becomes a control pattern (X-conjugated for
/// zero bits) around a `QControlBox`, lowered on later passes.
fn demultiplex(b: &MultiplexorBox) -> CompileResult<Circuit> {
    let n_controls = b.n_controls as usize;
    let n_targets = b.n_targets() as usize;
    let mut circ = Circuit::with_size((n_controls + n_targets) as u32, 0);
    for (sel, op) in &b.branches {
        let targets: Vec<UnitId> = (0..op.n_qubits())
            .map(|t| UnitId::default_qubit(n_controls as u32 + t))
            .collect();
        add_selected_control(&mut circ, *sel, n_controls, op.clone(), &targets)?;
    }
    Ok(circ)
}

/// Add `op` controlled on the control word equalling `sel`.
fn add_selected_control(
    circ: &mut Circuit,
    sel: u64,
    n_controls: usize,
    op: Op,
    targets: &[UnitId],
) -> CompileResult<()> {
    let zero_bits: Vec<u32> = (0..n_controls as u32)
        .filter(|i| sel & (1 << i) == 0)
        .collect();
    for &z in &zero_bits {
        circ.x(z).map_err(CompileError::Ir)?;
    }
    let boxed = Op::QControlBox(std::sync::Arc::new(QControlBox {
        op,
        n_controls: n_controls as u32,
    }));
    let mut args = default_qubits(n_controls);
    args.extend_from_slice(targets);
    circ.add_op(boxed, &args, None).map_err(CompileError::Ir)?;
    for &z in &zero_bits {
        circ.x(z).map_err(CompileError::Ir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::op::PauliExpBox;
    use std::sync::Arc;

    #[test]
    fn test_circbox_splices_inner() {
        let mut inner = Circuit::with_size(2, 0);
        inner.h(0).unwrap().cx(0, 1).unwrap();
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::CircBox(Arc::new(alsvid_ir::op::CircBox { circuit: inner })),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CircBox, false), 0);
        assert_eq!(circ.count_gates(OpType::H, false), 1);
        assert_eq!(circ.count_gates(OpType::CX, false), 1);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_pauli_exp_box_lowering() {
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::PauliExpBox(Arc::new(PauliExpBox::new(
                vec![Pauli::Z, Pauli::Z],
                0.4,
            ))),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 2);
        assert_eq!(circ.count_gates(OpType::Rz, false), 1);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_qcontrol_x_is_cx() {
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::QControlBox(Arc::new(QControlBox {
                op: Op::simple_gate(OpType::X),
                n_controls: 1,
            })),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::CX, false), 1);
        assert_eq!(circ.count_gates(OpType::QControlBox, false), 0);
    }

    #[test]
    fn test_controlled_s_lowering() {
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::QControlBox(Arc::new(QControlBox {
                op: Op::simple_gate(OpType::S),
                n_controls: 1,
            })),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::QControlBox, false), 0);
        assert_eq!(circ.count_gates(OpType::CX, false), 2);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_unitary_box_lowering() {
        // The Hadamard as a raw matrix.
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let c = |r: f64| Complex64::new(r, 0.0);
        let mut circ = Circuit::with_size(1, 0);
        circ.add_op(
            Op::Unitary1qBox(Arc::new(UnitaryBox::new(
                1,
                vec![c(s), c(s), c(s), c(-s)],
            ))),
            &default_qubits(1),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::Unitary1qBox, false), 0);
        assert!(circ.n_gates() >= 1);
    }

    #[test]
    fn test_multiplexed_rotation_gray_structure() {
        use alsvid_ir::op::MultiplexedRotationBox;
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::MultiplexedRotationBox(Arc::new(MultiplexedRotationBox {
                axis: OpType::Rz,
                angles: vec![Expr::constant(0.1), Expr::constant(0.5)],
            })),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().apply(&mut circ).unwrap());
        // One control: Rz(sum), CX, Rz(diff), CX.
        assert_eq!(circ.count_gates(OpType::Rz, false), 2);
        assert_eq!(circ.count_gates(OpType::CX, false), 2);
    }

    #[test]
    fn test_unsupported_boxes_left_alone() {
        let mut circ = Circuit::with_size(2, 0);
        let dim = 4usize;
        let mut mat = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            mat[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        circ.add_op(
            Op::Unitary2qBox(Arc::new(UnitaryBox::new(2, mat))),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(!decompose_boxes().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::Unitary2qBox, false), 1);
    }

    #[test]
    fn test_nested_boxes_lower_under_repeat() {
        // A multiplexor leaves QControlBoxes; repeat lowers them fully.
        use alsvid_ir::op::MultiplexorBox;
        let mut circ = Circuit::with_size(2, 0);
        circ.add_op(
            Op::MultiplexorBox(Arc::new(MultiplexorBox {
                n_controls: 1,
                branches: vec![(1, Op::simple_gate(OpType::X))],
            })),
            &default_qubits(2),
            None,
        )
        .unwrap();
        assert!(decompose_boxes().repeat().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::MultiplexorBox, false), 0);
        assert_eq!(circ.count_gates(OpType::QControlBox, false), 0);
        assert_eq!(circ.count_gates(OpType::CX, false), 1);
        circ.verify_integrity().unwrap();
    }
}
