//! High-level circuit construction.

use alsvid_types::{Expr, UnitId, UnitType};

use crate::circuit::{Circuit, NodeIndex, Vertex, Wire};
use crate::error::{CircuitError, IrResult};
use crate::op::{Op, OpType};
use crate::wire::WireType;

impl Circuit {
    /// Add an unanchored vertex carrying an operation. No edges are
    /// created; use [`rewire`](Circuit::rewire) or
    /// [`add_edge`](Circuit::add_edge) to connect it.
    pub fn add_vertex(&mut self, op: Op, opgroup: Option<String>) -> NodeIndex {
        self.graph.add_node(Vertex { op, opgroup })
    }

    /// Add an edge between two ports.
    ///
    /// Fails if a linear port is already saturated or the wire type does
    /// not match the operation signatures on either side.
    pub fn add_edge(
        &mut self,
        src: (NodeIndex, u32),
        tgt: (NodeIndex, u32),
        ty: WireType,
    ) -> IrResult<crate::circuit::EdgeIndex> {
        // Signature agreement on both endpoints.
        for ((v, port), incoming) in [(src, false), (tgt, true)] {
            let op = &self.graph[v].op;
            if !op.is_boundary() {
                let sig = op.signature();
                let expected = sig.get(port as usize).copied().ok_or_else(|| {
                    CircuitError::CircuitInvalidity(format!(
                        "port {port} out of range for {:?}",
                        op.optype()
                    ))
                })?;
                // A Boolean edge may leave a Classical write port.
                let compatible = expected == ty
                    || (!incoming && ty == WireType::Boolean && expected == WireType::Classical);
                if !compatible {
                    return Err(CircuitError::InvalidEdgeType {
                        edge: ty,
                        port: expected,
                    });
                }
            }
        }
        if ty.is_linear() {
            // Linear ports hold at most one linear edge on each side.
            if self.out_edge(src.0, src.1).is_ok() {
                return Err(CircuitError::CircuitInvalidity(format!(
                    "source port {} of {:?} is already saturated",
                    src.1, src.0
                )));
            }
        }
        if self.in_edge(tgt.0, tgt.1).is_ok() {
            return Err(CircuitError::CircuitInvalidity(format!(
                "target port {} of {:?} is already saturated",
                tgt.1, tgt.0
            )));
        }
        Ok(self.graph.add_edge(
            src.0,
            tgt.0,
            Wire {
                ty,
                src_port: src.1,
                tgt_port: tgt.1,
            },
        ))
    }

    /// Append an operation to the circuit on the given argument units.
    ///
    /// The operation's signature determines how each argument is wired:
    /// linear wires consume and advance the unit's frontier, Boolean
    /// wires read the last written value of the bit.
    pub fn add_op(
        &mut self,
        op: Op,
        args: &[UnitId],
        opgroup: Option<String>,
    ) -> IrResult<NodeIndex> {
        let sig = op.signature();
        if sig.len() != args.len() {
            return Err(CircuitError::InvalidArguments {
                op: op.optype(),
                expected: sig.len(),
                got: args.len(),
            });
        }

        // Validate argument kinds and existence up front.
        for (arg, ty) in args.iter().zip(&sig) {
            if !self.contains_unit(arg) {
                return Err(CircuitError::UnitNotFound {
                    unit: arg.clone(),
                    op: Some(op.optype()),
                });
            }
            let ok = match ty {
                WireType::Quantum => arg.unit_type() == UnitType::Qubit,
                WireType::Classical | WireType::Boolean => arg.unit_type() == UnitType::Bit,
                WireType::Wasm | WireType::Rng => arg.unit_type() == UnitType::WasmState,
            };
            if !ok {
                return Err(CircuitError::InvalidEdgeType {
                    edge: WireType::for_unit(arg),
                    port: *ty,
                });
            }
        }

        // No unit may appear twice in linear positions.
        let mut linear_args: Vec<&UnitId> = args
            .iter()
            .zip(&sig)
            .filter(|(_, ty)| ty.is_linear())
            .map(|(a, _)| a)
            .collect();
        linear_args.sort();
        for pair in linear_args.windows(2) {
            if pair[0] == pair[1] {
                return Err(CircuitError::CircuitInvalidity(format!(
                    "unit {} appears in more than one linear position",
                    pair[0]
                )));
            }
        }

        // Boolean reads attach to the writer of the bit's current value,
        // captured before any rewiring below.
        let mut bool_sources = Vec::new();
        for (port, (arg, ty)) in args.iter().zip(&sig).enumerate() {
            if *ty == WireType::Boolean {
                let final_edge = self.final_edge(arg)?;
                let w = self.wire(final_edge);
                bool_sources.push((port as u32, self.source(final_edge), w.src_port));
            }
        }

        let v = self.graph.add_node(Vertex { op, opgroup });

        // Linear wiring: splice the new vertex in front of each output
        // sentinel.
        for (port, (arg, ty)) in args.iter().zip(&sig).enumerate() {
            if !ty.is_linear() {
                continue;
            }
            let port = port as u32;
            let out_node = self.get_out(arg)?;
            let final_edge = self.in_edge(out_node, 0)?;
            let w = self.wire(final_edge);
            let prev = self.source(final_edge);
            self.graph.remove_edge(final_edge);
            self.graph.add_edge(
                prev,
                v,
                Wire {
                    ty: *ty,
                    src_port: w.src_port,
                    tgt_port: port,
                },
            );
            self.graph.add_edge(
                v,
                out_node,
                Wire {
                    ty: *ty,
                    src_port: port,
                    tgt_port: 0,
                },
            );
        }

        for (port, src, src_port) in bool_sources {
            self.graph.add_edge(
                src,
                v,
                Wire {
                    ty: WireType::Boolean,
                    src_port,
                    tgt_port: port,
                },
            );
        }

        Ok(v)
    }

    /// Append a primitive gate by tag.
    pub fn add_gate(
        &mut self,
        gate: OpType,
        params: Vec<Expr>,
        args: &[UnitId],
    ) -> IrResult<NodeIndex> {
        let op = Op::gate(gate, params)?;
        self.add_op(op, args, None)
    }

    /// Wrap `op` in a condition on `cargs` encoding `value` and append
    /// it. The condition bits precede the operation's own arguments.
    pub fn add_conditional_gate(
        &mut self,
        gate: OpType,
        params: Vec<Expr>,
        qargs: &[UnitId],
        cargs: &[UnitId],
        value: u64,
    ) -> IrResult<NodeIndex> {
        let inner = Op::gate(gate, params)?;
        let cond = Op::conditional(inner, cargs.len() as u32, value)?;
        let mut args: Vec<UnitId> = cargs.to_vec();
        args.extend_from_slice(qargs);
        self.add_op(cond, &args, None)
    }

    /// Measure a qubit onto a bit.
    pub fn add_measure(&mut self, qubit: UnitId, bit: UnitId) -> IrResult<NodeIndex> {
        self.add_gate(OpType::Measure, vec![], &[qubit, bit])
    }

    /// Add a barrier across the given units, with optional payload data.
    pub fn add_barrier(&mut self, args: &[UnitId], data: Option<String>) -> IrResult<NodeIndex> {
        let signature: Vec<WireType> = args.iter().map(WireType::for_unit).collect();
        let op = Op::Barrier {
            signature,
            data: data.unwrap_or_default(),
        };
        self.add_op(op, args, None)
    }

    // =========================================================================
    // Fluent gate helpers
    // =========================================================================

    /// Apply a Hadamard gate.
    pub fn h(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::H, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a Pauli-X gate.
    pub fn x(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::X, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a Pauli-Y gate.
    pub fn y(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Y, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a Pauli-Z gate.
    pub fn z(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Z, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply an S gate.
    pub fn s(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::S, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply an S-dagger gate.
    pub fn sdg(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Sdg, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a T gate.
    pub fn t(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::T, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a V (√X) gate.
    pub fn v(&mut self, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::V, vec![], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply an Rx rotation.
    pub fn rx(&mut self, theta: impl Into<Expr>, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Rx, vec![theta.into()], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply an Ry rotation.
    pub fn ry(&mut self, theta: impl Into<Expr>, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Ry, vec![theta.into()], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply an Rz rotation.
    pub fn rz(&mut self, theta: impl Into<Expr>, q: u32) -> IrResult<&mut Self> {
        self.add_gate(OpType::Rz, vec![theta.into()], &[UnitId::default_qubit(q)])?;
        Ok(self)
    }

    /// Apply a CX gate.
    pub fn cx(&mut self, control: u32, target: u32) -> IrResult<&mut Self> {
        self.add_gate(
            OpType::CX,
            vec![],
            &[
                UnitId::default_qubit(control),
                UnitId::default_qubit(target),
            ],
        )?;
        Ok(self)
    }

    /// Apply a CZ gate.
    pub fn cz(&mut self, control: u32, target: u32) -> IrResult<&mut Self> {
        self.add_gate(
            OpType::CZ,
            vec![],
            &[
                UnitId::default_qubit(control),
                UnitId::default_qubit(target),
            ],
        )?;
        Ok(self)
    }

    /// Apply a SWAP gate.
    pub fn swap(&mut self, q1: u32, q2: u32) -> IrResult<&mut Self> {
        self.add_gate(
            OpType::Swap,
            vec![],
            &[UnitId::default_qubit(q1), UnitId::default_qubit(q2)],
        )?;
        Ok(self)
    }

    /// Measure a default-register qubit onto a default-register bit.
    pub fn measure(&mut self, q: u32, c: u32) -> IrResult<&mut Self> {
        self.add_measure(UnitId::default_qubit(q), UnitId::default_bit(c))?;
        Ok(self)
    }
}
