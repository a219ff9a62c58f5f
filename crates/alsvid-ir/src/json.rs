//! JSON encoding of operations and circuits.
//!
//! Operations serialize as `{"type": <tag>, "params"?: […], …}` with
//! tag-specific fields; circuits serialize as their command stream
//! together with the boundary and the implicit permutation. Round trips
//! are structurally exact up to canonicalization of equivalent
//! expressions.

use num_complex::Complex64;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use std::sync::Arc;

use alsvid_types::{Expr, Pauli, UnitId, UnitType};

use crate::circuit::Circuit;
use crate::error::{CircuitError, IrResult};
use crate::op::{
    CircBox, ClassicalOp, CustomGate, CustomGateDef, ExpBox, MultiplexedRotationBox,
    MultiplexedTensoredU2Box, MultiplexorBox, Op, OpType, PauliExpBox, PauliExpCommutingSetBox,
    PauliExpPairBox, QControlBox, UnitaryBox, WasmOp,
};
use crate::wire::WireType;

/// Kind resolution context for deserializing command arguments, which
/// carry only `(register, index)` pairs.
struct UnitCtx {
    regs: Vec<(String, UnitType)>,
}

impl UnitCtx {
    fn for_circuit(qubits: &[UnitId], bits: &[UnitId], wasm: &[UnitId]) -> Self {
        let mut regs = Vec::new();
        for u in qubits.iter().chain(bits).chain(wasm) {
            if !regs.iter().any(|(n, _)| n == u.reg_name()) {
                regs.push((u.reg_name().to_string(), u.unit_type()));
            }
        }
        Self { regs }
    }

    fn resolve(&self, name: &str, index: Vec<u32>) -> IrResult<UnitId> {
        let ty = self
            .regs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .ok_or_else(|| {
                CircuitError::Deserialization(format!("argument register '{name}' is undeclared"))
            })?;
        Ok(UnitId::new(ty, name, index))
    }
}

fn unit_to_json(unit: &UnitId) -> Value {
    json!([unit.reg_name(), unit.index()])
}

fn unit_from_json(v: &Value) -> IrResult<(String, Vec<u32>)> {
    let arr = v
        .as_array()
        .filter(|a| a.len() == 2)
        .ok_or_else(|| CircuitError::Deserialization("unit must be [name, index]".to_string()))?;
    let name = arr[0]
        .as_str()
        .ok_or_else(|| CircuitError::Deserialization("unit name must be a string".to_string()))?;
    let index: Vec<u32> = serde_json::from_value(arr[1].clone())
        .map_err(|e| CircuitError::Deserialization(format!("bad unit index: {e}")))?;
    Ok((name.to_string(), index))
}

fn to_value<T: Serialize>(value: &T) -> IrResult<Value> {
    serde_json::to_value(value).map_err(|e| CircuitError::Deserialization(e.to_string()))
}

fn from_value<T: for<'de> Deserialize<'de>>(value: &Value, what: &str) -> IrResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| CircuitError::Deserialization(format!("bad {what}: {e}")))
}

fn field<'v>(v: &'v Value, name: &str) -> IrResult<&'v Value> {
    v.get(name)
        .ok_or_else(|| CircuitError::Deserialization(format!("missing field '{name}'")))
}

/// Serialize an operation to the `{"type": …}` shape.
pub fn op_to_json(op: &Op) -> IrResult<Value> {
    let tag = op.optype().name();
    Ok(match op {
        Op::Gate { params, .. } => {
            if params.is_empty() {
                json!({ "type": tag })
            } else {
                json!({ "type": tag, "params": to_value(params)? })
            }
        }
        Op::Input
        | Op::Output
        | Op::ClInput
        | Op::ClOutput
        | Op::WasmInput
        | Op::WasmOutput => json!({ "type": tag }),
        Op::Barrier { signature, data } => {
            json!({ "type": tag, "signature": to_value(signature)?, "data": data })
        }
        Op::Conditional(c) => json!({
            "type": tag,
            "width": c.width,
            "value": c.value,
            "conditioned_op": op_to_json(&c.op)?,
        }),
        Op::CircBox(b) => json!({ "type": tag, "circuit": circuit_to_json(&b.circuit)? }),
        Op::Unitary1qBox(b) | Op::Unitary2qBox(b) | Op::Unitary3qBox(b) => {
            json!({ "type": tag, "matrix": to_value(&b.matrix)? })
        }
        Op::ExpBox(b) => json!({
            "type": tag,
            "n_qubits": b.n_qubits,
            "hermitian": to_value(&b.hermitian)?,
            "t": b.t,
        }),
        Op::PauliExpBox(b) => json!({
            "type": tag,
            "paulis": to_value(&b.paulis)?,
            "t": to_value(&b.t)?,
        }),
        Op::PauliExpPairBox(b) => json!({
            "type": tag,
            "paulis0": to_value(&b.paulis0)?,
            "t0": to_value(&b.t0)?,
            "paulis1": to_value(&b.paulis1)?,
            "t1": to_value(&b.t1)?,
        }),
        Op::PauliExpCommutingSetBox(b) => json!({
            "type": tag,
            "gadgets": to_value(&b.gadgets)?,
        }),
        Op::QControlBox(b) => json!({
            "type": tag,
            "n_controls": b.n_controls,
            "op": op_to_json(&b.op)?,
        }),
        Op::MultiplexorBox(b) | Op::MultiplexedU2Box(b) => {
            let branches: Vec<Value> = b
                .branches
                .iter()
                .map(|(sel, op)| Ok(json!([sel, op_to_json(op)?])))
                .collect::<IrResult<_>>()?;
            json!({ "type": tag, "n_controls": b.n_controls, "branches": branches })
        }
        Op::MultiplexedRotationBox(b) => json!({
            "type": tag,
            "axis": b.axis.name(),
            "angles": to_value(&b.angles)?,
        }),
        Op::MultiplexedTensoredU2Box(b) => {
            let branches: Vec<Value> = b
                .branches
                .iter()
                .map(|(sel, ops)| {
                    let ops: Vec<Value> = ops.iter().map(op_to_json).collect::<IrResult<_>>()?;
                    Ok(json!([sel, ops]))
                })
                .collect::<IrResult<_>>()?;
            json!({ "type": tag, "n_controls": b.n_controls, "branches": branches })
        }
        Op::CustomGate(g) => json!({
            "type": tag,
            "name": g.def.name,
            "param_names": g.def.params,
            "definition": circuit_to_json(&g.def.definition)?,
            "params": to_value(&g.args)?,
        }),
        Op::Classical(c) => classical_to_json(c)?,
        Op::Wasm(w) => json!({
            "type": tag,
            "n": w.n,
            "ww_n": w.n_wires,
            "width_i_parameter": w.widths_in,
            "width_o_parameter": w.widths_out,
            "func_name": w.func_name,
            "wasm_file_uid": w.module_id,
        }),
    })
}

fn classical_to_json(c: &ClassicalOp) -> IrResult<Value> {
    let tag = c.optype().name();
    Ok(match c {
        ClassicalOp::SetBits { values } => json!({ "type": tag, "values": values }),
        ClassicalOp::CopyBits { n } => json!({ "type": tag, "n": n }),
        ClassicalOp::ExplicitPredicate { n, values, name }
        | ClassicalOp::ExplicitModifier { n, values, name } => {
            json!({ "type": tag, "n": n, "values": values, "name": name })
        }
        ClassicalOp::RangePredicate { n, a, b } => {
            json!({ "type": tag, "n": n, "lower": a, "upper": b })
        }
        ClassicalOp::MultiBit { op, n } => {
            json!({ "type": tag, "n": n, "op": classical_to_json(op)? })
        }
        ClassicalOp::ClassicalTransform { n, values, name } => {
            json!({ "type": tag, "n": n, "values": values, "name": name })
        }
    })
}

/// Deserialize an operation from the `{"type": …}` shape.
pub fn op_from_json(v: &Value) -> IrResult<Op> {
    let tag = field(v, "type")?
        .as_str()
        .ok_or_else(|| CircuitError::Deserialization("'type' must be a string".to_string()))?;
    let optype = OpType::from_name(tag)
        .ok_or_else(|| CircuitError::Deserialization(format!("unknown op type '{tag}'")))?;

    if optype.is_gate() {
        let params: Vec<Expr> = match v.get("params") {
            Some(p) => from_value(p, "gate params")?,
            None => vec![],
        };
        return Op::gate(optype, params)
            .map_err(|e| CircuitError::Deserialization(e.to_string()));
    }

    Ok(match optype {
        OpType::Input => Op::Input,
        OpType::Output => Op::Output,
        OpType::ClInput => Op::ClInput,
        OpType::ClOutput => Op::ClOutput,
        OpType::WasmInput => Op::WasmInput,
        OpType::WasmOutput => Op::WasmOutput,
        OpType::Barrier => Op::Barrier {
            signature: from_value::<Vec<WireType>>(field(v, "signature")?, "barrier signature")?,
            data: from_value(field(v, "data")?, "barrier data")?,
        },
        OpType::Conditional => {
            let inner = op_from_json(field(v, "conditioned_op")?)?;
            let width: u32 = from_value(field(v, "width")?, "condition width")?;
            let value: u64 = from_value(field(v, "value")?, "condition value")?;
            Op::conditional(inner, width, value)
                .map_err(|e| CircuitError::Deserialization(e.to_string()))?
        }
        OpType::CircBox => Op::CircBox(Arc::new(CircBox {
            circuit: circuit_from_json(field(v, "circuit")?)?,
        })),
        OpType::Unitary1qBox | OpType::Unitary2qBox | OpType::Unitary3qBox => {
            let matrix: Vec<Complex64> = from_value(field(v, "matrix")?, "unitary matrix")?;
            let n = match optype {
                OpType::Unitary1qBox => 1,
                OpType::Unitary2qBox => 2,
                _ => 3,
            };
            let dim = 1usize << n;
            if matrix.len() != dim * dim {
                return Err(CircuitError::Deserialization(format!(
                    "matrix of length {} for a {n}-qubit box",
                    matrix.len()
                )));
            }
            let b = Arc::new(UnitaryBox { n_qubits: n, matrix });
            match optype {
                OpType::Unitary1qBox => Op::Unitary1qBox(b),
                OpType::Unitary2qBox => Op::Unitary2qBox(b),
                _ => Op::Unitary3qBox(b),
            }
        }
        OpType::ExpBox => {
            let n_qubits: u32 = from_value(field(v, "n_qubits")?, "ExpBox qubit count")?;
            let hermitian: Vec<Complex64> = from_value(field(v, "hermitian")?, "ExpBox matrix")?;
            let dim = 1usize << n_qubits;
            if hermitian.len() != dim * dim {
                return Err(CircuitError::Deserialization(
                    "ExpBox matrix size mismatch".to_string(),
                ));
            }
            Op::ExpBox(Arc::new(ExpBox {
                n_qubits,
                hermitian,
                t: from_value(field(v, "t")?, "ExpBox scale")?,
            }))
        }
        OpType::PauliExpBox => Op::PauliExpBox(Arc::new(PauliExpBox {
            paulis: from_value::<Vec<Pauli>>(field(v, "paulis")?, "Pauli string")?,
            t: from_value(field(v, "t")?, "Pauli angle")?,
        })),
        OpType::PauliExpPairBox => Op::PauliExpPairBox(Arc::new(PauliExpPairBox {
            paulis0: from_value(field(v, "paulis0")?, "Pauli string")?,
            t0: from_value(field(v, "t0")?, "Pauli angle")?,
            paulis1: from_value(field(v, "paulis1")?, "Pauli string")?,
            t1: from_value(field(v, "t1")?, "Pauli angle")?,
        })),
        OpType::PauliExpCommutingSetBox => {
            Op::PauliExpCommutingSetBox(Arc::new(PauliExpCommutingSetBox {
                gadgets: from_value(field(v, "gadgets")?, "Pauli gadgets")?,
            }))
        }
        OpType::QControlBox => Op::QControlBox(Arc::new(QControlBox {
            op: op_from_json(field(v, "op")?)?,
            n_controls: from_value(field(v, "n_controls")?, "control count")?,
        })),
        OpType::MultiplexorBox | OpType::MultiplexedU2Box => {
            let raw = field(v, "branches")?
                .as_array()
                .ok_or_else(|| {
                    CircuitError::Deserialization("branches must be an array".to_string())
                })?;
            let mut branches = Vec::with_capacity(raw.len());
            for b in raw {
                let pair = b.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                    CircuitError::Deserialization("branch must be [selector, op]".to_string())
                })?;
                branches.push((
                    from_value::<u64>(&pair[0], "branch selector")?,
                    op_from_json(&pair[1])?,
                ));
            }
            let b = Arc::new(MultiplexorBox {
                n_controls: from_value(field(v, "n_controls")?, "control count")?,
                branches,
            });
            if optype == OpType::MultiplexorBox {
                Op::MultiplexorBox(b)
            } else {
                Op::MultiplexedU2Box(b)
            }
        }
        OpType::MultiplexedRotationBox => {
            let axis_name: String = from_value(field(v, "axis")?, "rotation axis")?;
            let axis = OpType::from_name(&axis_name)
                .filter(|t| matches!(t, OpType::Rx | OpType::Ry | OpType::Rz))
                .ok_or_else(|| {
                    CircuitError::Deserialization(format!("bad rotation axis '{axis_name}'"))
                })?;
            Op::MultiplexedRotationBox(Arc::new(MultiplexedRotationBox {
                axis,
                angles: from_value(field(v, "angles")?, "rotation angles")?,
            }))
        }
        OpType::MultiplexedTensoredU2Box => {
            let raw = field(v, "branches")?
                .as_array()
                .ok_or_else(|| {
                    CircuitError::Deserialization("branches must be an array".to_string())
                })?;
            let mut branches = Vec::with_capacity(raw.len());
            for b in raw {
                let pair = b.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                    CircuitError::Deserialization("branch must be [selector, ops]".to_string())
                })?;
                let ops_raw = pair[1].as_array().ok_or_else(|| {
                    CircuitError::Deserialization("branch ops must be an array".to_string())
                })?;
                let ops = ops_raw
                    .iter()
                    .map(op_from_json)
                    .collect::<IrResult<Vec<_>>>()?;
                branches.push((from_value::<u64>(&pair[0], "branch selector")?, ops));
            }
            Op::MultiplexedTensoredU2Box(Arc::new(MultiplexedTensoredU2Box {
                n_controls: from_value(field(v, "n_controls")?, "control count")?,
                branches,
            }))
        }
        OpType::CustomGate => Op::CustomGate(Arc::new(CustomGate {
            def: Arc::new(CustomGateDef {
                name: from_value(field(v, "name")?, "custom gate name")?,
                params: from_value(field(v, "param_names")?, "custom gate parameter names")?,
                definition: circuit_from_json(field(v, "definition")?)?,
            }),
            args: from_value(field(v, "params")?, "custom gate arguments")?,
        })),
        OpType::SetBits => Op::Classical(ClassicalOp::SetBits {
            values: from_value(field(v, "values")?, "SetBits values")?,
        }),
        OpType::CopyBits => Op::Classical(ClassicalOp::CopyBits {
            n: from_value(field(v, "n")?, "CopyBits width")?,
        }),
        OpType::ExplicitPredicate => Op::Classical(ClassicalOp::ExplicitPredicate {
            n: from_value(field(v, "n")?, "predicate width")?,
            values: from_value(field(v, "values")?, "predicate table")?,
            name: from_value(field(v, "name")?, "predicate name")?,
        }),
        OpType::ExplicitModifier => Op::Classical(ClassicalOp::ExplicitModifier {
            n: from_value(field(v, "n")?, "modifier width")?,
            values: from_value(field(v, "values")?, "modifier table")?,
            name: from_value(field(v, "name")?, "modifier name")?,
        }),
        OpType::RangePredicate => Op::Classical(ClassicalOp::RangePredicate {
            n: from_value(field(v, "n")?, "predicate width")?,
            a: from_value(field(v, "lower")?, "lower bound")?,
            b: from_value(field(v, "upper")?, "upper bound")?,
        }),
        OpType::MultiBit => {
            let Op::Classical(inner) = op_from_json(field(v, "op")?)? else {
                return Err(CircuitError::Deserialization(
                    "MultiBit op must be classical".to_string(),
                ));
            };
            Op::Classical(ClassicalOp::MultiBit {
                op: Arc::new(inner),
                n: from_value(field(v, "n")?, "tile count")?,
            })
        }
        OpType::ClassicalTransform => Op::Classical(ClassicalOp::ClassicalTransform {
            n: from_value(field(v, "n")?, "transform width")?,
            values: from_value(field(v, "values")?, "transform table")?,
            name: from_value(field(v, "name")?, "transform name")?,
        }),
        OpType::WasmOp => {
            let w = WasmOp::new(
                from_value(field(v, "n")?, "WASM bit count")?,
                from_value(field(v, "ww_n")?, "WASM wire count")?,
                from_value(field(v, "width_i_parameter")?, "WASM input widths")?,
                from_value(field(v, "width_o_parameter")?, "WASM output widths")?,
                from_value::<String>(field(v, "func_name")?, "WASM function name")?,
                from_value::<String>(field(v, "wasm_file_uid")?, "WASM module id")?,
            )
            .map_err(|e| CircuitError::Deserialization(e.to_string()))?;
            Op::Wasm(Arc::new(w))
        }
        _ => {
            return Err(CircuitError::Deserialization(format!(
                "op type '{tag}' cannot appear here"
            )));
        }
    })
}

/// Serialize a circuit.
pub fn circuit_to_json(circ: &Circuit) -> IrResult<Value> {
    let commands: Vec<Value> = circ
        .commands()?
        .into_iter()
        .map(|cmd| {
            let mut obj = serde_json::Map::new();
            obj.insert("op".to_string(), op_to_json(&cmd.op)?);
            obj.insert(
                "args".to_string(),
                Value::Array(cmd.args.iter().map(unit_to_json).collect()),
            );
            if let Some(g) = cmd.opgroup {
                obj.insert("opgroup".to_string(), Value::String(g));
            }
            Ok(Value::Object(obj))
        })
        .collect::<IrResult<_>>()?;
    let perm: Vec<Value> = circ
        .implicit_qubit_permutation()
        .iter()
        .map(|(a, b)| json!([unit_to_json(a), unit_to_json(b)]))
        .collect();
    Ok(json!({
        "name": circ.name(),
        "phase": to_value(circ.phase())?,
        "qubits": circ.all_qubits().iter().map(unit_to_json).collect::<Vec<_>>(),
        "bits": circ.all_bits().iter().map(unit_to_json).collect::<Vec<_>>(),
        "wasm_states": circ.all_wasm_states().iter().map(unit_to_json).collect::<Vec<_>>(),
        "commands": commands,
        "implicit_permutation": perm,
    }))
}

/// Deserialize a circuit.
pub fn circuit_from_json(v: &Value) -> IrResult<Circuit> {
    let read_units = |key: &str, ty: UnitType| -> IrResult<Vec<UnitId>> {
        let Some(arr) = v.get(key).and_then(Value::as_array) else {
            return Ok(vec![]);
        };
        arr.iter()
            .map(|u| {
                let (name, index) = unit_from_json(u)?;
                Ok(UnitId::new(ty, name, index))
            })
            .collect()
    };
    let qubits = read_units("qubits", UnitType::Qubit)?;
    let bits = read_units("bits", UnitType::Bit)?;
    let wasm = read_units("wasm_states", UnitType::WasmState)?;
    let ctx = UnitCtx::for_circuit(&qubits, &bits, &wasm);

    let mut circ = Circuit::new();
    if let Some(name) = v.get("name").and_then(Value::as_str) {
        circ.set_name(name);
    }
    for u in qubits.iter().chain(&bits).chain(&wasm) {
        circ.add_unit_any(u.clone())
            .map_err(|e| CircuitError::Deserialization(e.to_string()))?;
    }

    if let Some(commands) = v.get("commands").and_then(Value::as_array) {
        for cmd in commands {
            let op = op_from_json(field(cmd, "op")?)?;
            let args: Vec<UnitId> = field(cmd, "args")?
                .as_array()
                .ok_or_else(|| {
                    CircuitError::Deserialization("command args must be an array".to_string())
                })?
                .iter()
                .map(|a| {
                    let (name, index) = unit_from_json(a)?;
                    ctx.resolve(&name, index)
                })
                .collect::<IrResult<_>>()?;
            let opgroup = cmd
                .get("opgroup")
                .and_then(Value::as_str)
                .map(str::to_string);
            circ.add_op(op, &args, opgroup)
                .map_err(|e| CircuitError::Deserialization(e.to_string()))?;
        }
    }

    if let Some(phase) = v.get("phase") {
        let phase: Expr = from_value(phase, "global phase")?;
        circ.add_phase(phase);
    }

    if let Some(perm) = v.get("implicit_permutation").and_then(Value::as_array) {
        let mut pairs = Vec::new();
        for p in perm {
            let pair = p.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                CircuitError::Deserialization("permutation entry must be a pair".to_string())
            })?;
            let (n0, i0) = unit_from_json(&pair[0])?;
            let (n1, i1) = unit_from_json(&pair[1])?;
            pairs.push((ctx.resolve(&n0, i0)?, ctx.resolve(&n1, i1)?));
        }
        if pairs.iter().any(|(a, b)| a != b) {
            circ.set_implicit_permutation(&pairs)
                .map_err(|e| CircuitError::Deserialization(e.to_string()))?;
        }
    }

    Ok(circ)
}

impl Serialize for Circuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        circuit_to_json(self)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Circuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        circuit_from_json(&v).map_err(D::Error::custom)
    }
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        op_to_json(self)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Op {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        op_from_json(&v).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(circ: &Circuit) -> Circuit {
        let v = circuit_to_json(circ).unwrap();
        circuit_from_json(&v).unwrap()
    }

    #[test]
    fn test_simple_round_trip() {
        let mut circ = Circuit::with_size(2, 1);
        circ.set_name("demo");
        circ.h(0).unwrap().cx(0, 1).unwrap().measure(1, 0).unwrap();
        let back = round_trip(&circ);
        assert_eq!(circ, back);
        assert_eq!(back.name(), Some("demo"));
    }

    #[test]
    fn test_round_trip_with_params_and_phase() {
        let mut circ = Circuit::with_size(1, 0);
        circ.rz(Expr::symbol("a"), 0).unwrap();
        circ.add_phase(Expr::constant(0.5));
        let back = round_trip(&circ);
        assert_eq!(circ, back);
        assert!(back.free_symbols().contains("a"));
    }

    #[test]
    fn test_round_trip_conditional() {
        let mut circ = Circuit::with_size(1, 2);
        circ.add_conditional_gate(
            OpType::X,
            vec![],
            &[UnitId::default_qubit(0)],
            &[UnitId::default_bit(0), UnitId::default_bit(1)],
            3,
        )
        .unwrap();
        let back = round_trip(&circ);
        assert_eq!(circ, back);
    }

    #[test]
    fn test_round_trip_implicit_permutation() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().swap(0, 1).unwrap();
        circ.replace_swaps().unwrap();
        let back = round_trip(&circ);
        assert_eq!(
            circ.implicit_qubit_permutation(),
            back.implicit_qubit_permutation()
        );
        assert_eq!(circ, back);
    }

    #[test]
    fn test_round_trip_boxes() {
        let mut circ = Circuit::with_size(2, 0);
        let pauli = Op::PauliExpBox(Arc::new(PauliExpBox::new(
            vec![Pauli::Z, Pauli::X],
            Expr::constant(0.3),
        )));
        circ.add_op(
            pauli,
            &[UnitId::default_qubit(0), UnitId::default_qubit(1)],
            None,
        )
        .unwrap();
        let back = round_trip(&circ);
        assert_eq!(circ, back);
    }

    #[test]
    fn test_round_trip_classical_and_opgroup() {
        let mut circ = Circuit::with_size(0, 3);
        circ.add_op(
            Op::Classical(crate::op::classical::and_op()),
            &[
                UnitId::default_bit(0),
                UnitId::default_bit(1),
                UnitId::default_bit(2),
            ],
            Some("logic".to_string()),
        )
        .unwrap();
        let back = round_trip(&circ);
        assert_eq!(circ, back);
        let cmds = back.commands().unwrap();
        assert_eq!(cmds[0].opgroup.as_deref(), Some("logic"));
    }

    #[test]
    fn test_wasm_round_trip() {
        let mut circ = Circuit::with_size(0, 2);
        circ.add_wasm_state(UnitId::wasm_state(0)).unwrap();
        let w = WasmOp::new(2, 1, vec![1], vec![1], "f", "mod0").unwrap();
        circ.add_op(
            Op::Wasm(Arc::new(w)),
            &[
                UnitId::default_bit(0),
                UnitId::default_bit(1),
                UnitId::wasm_state(0),
            ],
            None,
        )
        .unwrap();
        let back = round_trip(&circ);
        assert_eq!(circ, back);
    }
}
