//! Whole-circuit operations: dagger, transpose, append, conditioning and
//! symbol substitution.

use rustc_hash::FxHashMap;

use alsvid_types::{Expr, UnitId, UnitType};

use crate::circuit::Circuit;
use crate::error::{CircuitError, IrResult};
use crate::op::{Op, OpType};

impl Circuit {
    /// Replace free symbols in every vertex and in the global phase.
    pub fn symbol_substitution(&mut self, map: &FxHashMap<String, Expr>) {
        let nodes: Vec<_> = self.graph.node_indices().collect();
        for v in nodes {
            let new_op = self.graph[v].op.symbol_substitution(map);
            self.graph[v].op = new_op;
        }
        self.phase = self.phase.substitute(map);
    }

    /// A copy of this circuit with any implicit permutation made
    /// explicit.
    fn reified(&self) -> IrResult<Circuit> {
        if self.has_implicit_wireswaps() {
            let mut clone = self.clone();
            clone.replace_all_implicit_wire_swaps()?;
            Ok(clone)
        } else {
            Ok(self.clone())
        }
    }

    /// A circuit with the same boundary and no operations.
    fn empty_like(&self) -> Circuit {
        let mut out = Circuit::new();
        out.name = self.name.clone();
        for unit in &self.units {
            out.add_unit_any(unit.clone())
                .expect("units of a well-formed circuit re-add cleanly");
        }
        out
    }

    /// Add a unit endpoint of any kind.
    pub fn add_unit_any(&mut self, unit: UnitId) -> IrResult<()> {
        match unit.unit_type() {
            UnitType::Qubit => self.add_qubit(unit),
            UnitType::Bit => self.add_bit(unit),
            UnitType::WasmState => self.add_wasm_state(unit),
        }
    }

    /// The adjoint circuit: commands reversed and daggered.
    ///
    /// Circuits with implicit wireswaps are reified first, so the result
    /// always has an identity permutation.
    pub fn dagger(&self) -> IrResult<Circuit> {
        let src = self.reified()?;
        let mut out = src.empty_like();
        let commands = src.commands()?;
        for cmd in commands.into_iter().rev() {
            out.add_op(cmd.op.dagger()?, &cmd.args, cmd.opgroup)?;
        }
        out.phase = (-src.phase.clone()).simplify();
        Ok(out)
    }

    /// The transposed circuit: commands reversed and transposed.
    ///
    /// Each `Y` gate transposes to itself up to a global phase of −1,
    /// accounted for in the result's phase.
    pub fn transpose(&self) -> IrResult<Circuit> {
        let src = self.reified()?;
        let mut out = src.empty_like();
        let commands = src.commands()?;
        let mut phase = src.phase.clone();
        for cmd in commands.into_iter().rev() {
            if cmd.op.optype() == OpType::Y {
                phase = phase + Expr::Pi;
            }
            out.add_op(cmd.op.transpose()?, &cmd.args, cmd.opgroup)?;
        }
        out.phase = phase.simplify();
        Ok(out)
    }

    /// Concatenate `other` onto the matching units of this circuit.
    ///
    /// Every unit of `other` must already be present here.
    pub fn append(&mut self, other: &Circuit) -> IrResult<()> {
        let other = other.reified()?;
        for unit in &other.units {
            if !self.contains_unit(unit) {
                return Err(CircuitError::UnitMismatch(format!(
                    "unit {unit} of the appended circuit is absent from the host"
                )));
            }
        }
        for cmd in other.commands()? {
            self.add_op(cmd.op, &cmd.args, cmd.opgroup)?;
        }
        self.add_phase(other.phase.clone());
        Ok(())
    }

    /// Concatenate `other`, relabelling its units through `map`.
    ///
    /// The map must cover exactly the units of `other` and every image
    /// must exist in this circuit.
    pub fn append_with_map(
        &mut self,
        other: &Circuit,
        map: &FxHashMap<UnitId, UnitId>,
    ) -> IrResult<()> {
        let other = other.reified()?;
        for unit in &other.units {
            let Some(image) = map.get(unit) else {
                return Err(CircuitError::UnitMismatch(format!(
                    "append map does not cover unit {unit}"
                )));
            };
            if !self.contains_unit(image) {
                return Err(CircuitError::UnitMismatch(format!(
                    "append map image {image} is absent from the host"
                )));
            }
        }
        if map.len() != other.units.len() {
            return Err(CircuitError::UnitMismatch(format!(
                "append map has {} entries for {} units",
                map.len(),
                other.units.len()
            )));
        }
        for cmd in other.commands()? {
            let args: Vec<UnitId> = cmd.args.iter().map(|a| map[a].clone()).collect();
            self.add_op(cmd.op, &args, cmd.opgroup)?;
        }
        self.add_phase(other.phase.clone());
        Ok(())
    }

    /// Concatenate a default-register circuit onto the listed qubits:
    /// `other`'s `q[i]` lands on this circuit's `q[qubits[i]]`.
    pub fn append_qubits(&mut self, other: &Circuit, qubits: &[u32]) -> IrResult<()> {
        let other_qubits = other.all_qubits();
        if other_qubits.len() != qubits.len() {
            return Err(CircuitError::UnitMismatch(format!(
                "{} qubits supplied for a {}-qubit circuit",
                qubits.len(),
                other_qubits.len()
            )));
        }
        if !other.all_bits().is_empty() || !other.all_wasm_states().is_empty() {
            return Err(CircuitError::UnitMismatch(
                "append_qubits requires a purely quantum circuit".to_string(),
            ));
        }
        let mut map = FxHashMap::default();
        for (u, &i) in other_qubits.iter().zip(qubits) {
            map.insert(u.clone(), UnitId::default_qubit(i));
        }
        self.append_with_map(other, &map)
    }

    /// A copy of this circuit with every operation wrapped in a
    /// condition on `bits` encoding `value`.
    ///
    /// Fails with [`CircuitError::InvalidCondition`] if the circuit has
    /// implicit wireswaps, writes to any of the condition bits, or
    /// touches them through an external WASM call.
    pub fn conditional_circuit(&self, bits: &[UnitId], value: u64) -> IrResult<Circuit> {
        if self.has_implicit_wireswaps() {
            return Err(CircuitError::InvalidCondition(
                "circuit has implicit wireswaps".to_string(),
            ));
        }
        let width = bits.len() as u32;
        if width < 64 && value >= (1u64 << width) {
            return Err(CircuitError::ConditionValueOutOfRange { value, width });
        }
        let commands = self.commands()?;
        for cmd in &commands {
            let sig = cmd.op.signature();
            for (arg, ty) in cmd.args.iter().zip(&sig) {
                if bits.contains(arg) && ty.is_linear() {
                    return Err(CircuitError::InvalidCondition(format!(
                        "circuit writes to condition bit {arg}"
                    )));
                }
            }
            if cmd.op.is_extern() && cmd.args.iter().any(|a| bits.contains(a)) {
                return Err(CircuitError::InvalidCondition(
                    "external WASM op acts on a condition bit".to_string(),
                ));
            }
        }
        let mut out = self.empty_like();
        for bit in bits {
            if !out.contains_unit(bit) {
                out.add_bit(bit.clone())?;
            }
        }
        for cmd in commands {
            let cond = Op::conditional(cmd.op, width, value)?;
            let mut args: Vec<UnitId> = bits.to_vec();
            args.extend(cmd.args);
            out.add_op(cond, &args, cmd.opgroup)?;
        }
        out.phase = self.phase.clone();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpType;

    #[test]
    fn test_dagger_involutive() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .rz(0.25, 1)
            .unwrap();
        let dd = circ.dagger().unwrap().dagger().unwrap();
        assert_eq!(circ, dd);
    }

    #[test]
    fn test_dagger_reverses_and_inverts() {
        let mut circ = Circuit::with_size(1, 0);
        circ.s(0).unwrap().t(0).unwrap();
        let dag = circ.dagger().unwrap();
        let cmds = dag.commands().unwrap();
        assert_eq!(cmds[0].op.optype(), OpType::Tdg);
        assert_eq!(cmds[1].op.optype(), OpType::Sdg);
    }

    #[test]
    fn test_transpose_involutive() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().y(0).unwrap().cx(0, 1).unwrap();
        let tt = circ.transpose().unwrap().transpose().unwrap();
        // Double transpose restores commands; phases cancel mod 2π.
        assert_eq!(circ.commands().unwrap(), tt.commands().unwrap());
    }

    #[test]
    fn test_append() {
        let mut a = Circuit::with_size(2, 0);
        a.h(0).unwrap();
        let mut b = Circuit::with_size(2, 0);
        b.cx(0, 1).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.n_gates(), 2);
        // Gate counts add under append.
        assert_eq!(a.count_gates(OpType::H, false), 1);
        assert_eq!(a.count_gates(OpType::CX, false), 1);
    }

    #[test]
    fn test_append_missing_unit() {
        let mut a = Circuit::with_size(1, 0);
        let mut b = Circuit::with_size(2, 0);
        b.cx(0, 1).unwrap();
        assert!(matches!(
            a.append(&b),
            Err(CircuitError::UnitMismatch(_))
        ));
    }

    #[test]
    fn test_append_qubits_relabels() {
        let mut a = Circuit::with_size(3, 0);
        let mut b = Circuit::with_size(2, 0);
        b.cx(0, 1).unwrap();
        a.append_qubits(&b, &[2, 0]).unwrap();
        let cmds = a.commands().unwrap();
        assert_eq!(
            cmds[0].args,
            vec![UnitId::default_qubit(2), UnitId::default_qubit(0)]
        );
    }

    #[test]
    fn test_conditional_circuit_wraps_everything() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().cx(0, 1).unwrap();
        let bits = vec![UnitId::bit("flag", 0)];
        let cond = circ.conditional_circuit(&bits, 1).unwrap();
        assert_eq!(cond.count_gates(OpType::Conditional, false), 2);
        assert_eq!(cond.count_gates(OpType::H, true), 1);
        cond.verify_integrity().unwrap();
    }

    #[test]
    fn test_conditional_circuit_rejects_writes_to_condition() {
        let mut circ = Circuit::with_size(1, 1);
        circ.measure(0, 0).unwrap();
        let bits = vec![UnitId::default_bit(0)];
        assert!(matches!(
            circ.conditional_circuit(&bits, 1),
            Err(CircuitError::InvalidCondition(_))
        ));
    }

    #[test]
    fn test_conditional_circuit_rejects_implicit_swaps() {
        let mut circ = Circuit::with_size(2, 0);
        circ.swap(0, 1).unwrap();
        circ.replace_swaps().unwrap();
        let bits = vec![UnitId::bit("flag", 0)];
        assert!(matches!(
            circ.conditional_circuit(&bits, 1),
            Err(CircuitError::InvalidCondition(_))
        ));
    }

    #[test]
    fn test_symbol_substitution_removes_symbols() {
        let mut circ = Circuit::with_size(1, 0);
        circ.rz(Expr::symbol("a"), 0).unwrap();
        circ.add_phase(Expr::symbol("b"));
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), Expr::constant(0.5));
        map.insert("b".to_string(), Expr::constant(0.25));
        circ.symbol_substitution(&map);
        assert!(circ.free_symbols().is_empty());
    }
}
