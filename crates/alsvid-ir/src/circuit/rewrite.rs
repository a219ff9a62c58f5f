//! Rewrite primitives: vertex removal, rewiring and subcircuit
//! substitution.

use rustc_hash::{FxHashMap, FxHashSet};

use alsvid_types::UnitType;

use crate::circuit::{Circuit, EdgeIndex, NodeIndex, Vertex, Wire};
use crate::error::{CircuitError, IrResult};
use crate::op::Op;
use crate::wire::WireType;

/// Whether a removed vertex's neighbours are reconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRewiring {
    /// Reconnect each in-edge's source to the matching out-edge's target.
    Yes,
    /// Leave the neighbours dangling; the caller re-stitches them.
    No,
}

/// Whether a removed vertex is deleted from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexDeletion {
    /// Delete the vertex.
    Yes,
    /// Keep the vertex, detached, for re-insertion via
    /// [`Circuit::rewire`].
    No,
}

/// A region of a circuit named by its boundary edges.
///
/// `in_edges[i]` and `out_edges[i]` bracket the i-th wire slot of the
/// region; they may be the same edge when the region straddles a single
/// edge on that wire. Every vertex whose edges all lie inside the
/// region belongs to `vertices`.
#[derive(Debug, Clone, Default)]
pub struct Subcircuit {
    /// Ordered in-edges, one per linear wire slot.
    pub in_edges: Vec<EdgeIndex>,
    /// Ordered out-edges, matching `in_edges` slot for slot.
    pub out_edges: Vec<EdgeIndex>,
    /// The interior vertices.
    pub vertices: Vec<NodeIndex>,
}

impl Circuit {
    /// The single-vertex subcircuit around `v` (linear wires only).
    ///
    /// Fails if `v` has Boolean inputs; those regions cannot be named by
    /// linear boundary slots alone.
    pub fn singleton_subcircuit(&self, v: NodeIndex) -> IrResult<Subcircuit> {
        let sig = self.op(v).signature();
        let mut in_edges = Vec::new();
        let mut out_edges = Vec::new();
        for (port, ty) in sig.iter().enumerate() {
            if !ty.is_linear() {
                return Err(CircuitError::SubstitutionMismatch(format!(
                    "vertex {v:?} has Boolean inputs"
                )));
            }
            in_edges.push(self.in_edge(v, port as u32)?);
            out_edges.push(self.out_edge(v, port as u32)?);
        }
        Ok(Subcircuit {
            in_edges,
            out_edges,
            vertices: vec![v],
        })
    }

    /// Remove a vertex.
    ///
    /// With [`GraphRewiring::Yes`], each in-edge's source is reconnected
    /// to the matching out-edge's target port-by-port, and Boolean
    /// readers of the vertex's classical writes are redirected to read
    /// the upstream write of the same bit.
    pub fn remove_vertex(
        &mut self,
        v: NodeIndex,
        rewiring: GraphRewiring,
        deletion: VertexDeletion,
    ) -> IrResult<()> {
        if self.op(v).is_boundary() {
            return Err(CircuitError::CircuitInvalidity(
                "cannot remove a boundary vertex".to_string(),
            ));
        }
        if rewiring == GraphRewiring::Yes {
            let sig = self.op(v).signature();
            for (port, ty) in sig.iter().enumerate() {
                let port = port as u32;
                if !ty.is_linear() {
                    continue;
                }
                let in_e = self.in_edge(v, port)?;
                let out_e = self.out_edge(v, port)?;
                let in_w = self.wire(in_e);
                let out_w = self.wire(out_e);
                let src = self.source(in_e);
                let tgt = self.target(out_e);
                // Boolean readers of this write move to the upstream
                // writer.
                if *ty == WireType::Classical {
                    for b in self.b_out_bundle(v, port) {
                        let b_w = self.wire(b);
                        let b_tgt = self.target(b);
                        self.graph.remove_edge(b);
                        self.graph.add_edge(
                            src,
                            b_tgt,
                            Wire {
                                ty: WireType::Boolean,
                                src_port: in_w.src_port,
                                tgt_port: b_w.tgt_port,
                            },
                        );
                    }
                }
                self.graph.remove_edge(in_e);
                self.graph.remove_edge(out_e);
                self.graph.add_edge(
                    src,
                    tgt,
                    Wire {
                        ty: *ty,
                        src_port: in_w.src_port,
                        tgt_port: out_w.tgt_port,
                    },
                );
            }
            // Drop any remaining Boolean reads into the vertex.
            use petgraph::visit::EdgeRef;
            let leftover: Vec<EdgeIndex> = self
                .graph
                .edges_directed(v, petgraph::Direction::Incoming)
                .map(|e| e.id())
                .collect();
            for e in leftover {
                self.graph.remove_edge(e);
            }
        }
        if deletion == VertexDeletion::Yes {
            self.graph.remove_node(v);
        }
        Ok(())
    }

    /// Attach a detached vertex onto existing edges.
    ///
    /// `edges[i]` supplies port `i` of the vertex: linear edges are
    /// broken and rerouted through the vertex, Boolean ports read from
    /// the edge's source without consuming the edge.
    pub fn rewire(
        &mut self,
        v: NodeIndex,
        edges: &[EdgeIndex],
        types: &[WireType],
    ) -> IrResult<()> {
        let sig = self.op(v).signature();
        if sig.len() != edges.len() || sig.len() != types.len() {
            return Err(CircuitError::InvalidArguments {
                op: self.op(v).optype(),
                expected: sig.len(),
                got: edges.len(),
            });
        }
        for (ty, expected) in types.iter().zip(&sig) {
            if ty != expected {
                return Err(CircuitError::InvalidEdgeType {
                    edge: *ty,
                    port: *expected,
                });
            }
        }
        for (port, (&e, ty)) in edges.iter().zip(&sig).enumerate() {
            let port = port as u32;
            let w = self.wire(e);
            let src = self.source(e);
            let tgt = self.target(e);
            if ty.is_linear() {
                if w.ty != *ty {
                    return Err(CircuitError::InvalidEdgeType {
                        edge: w.ty,
                        port: *ty,
                    });
                }
                self.graph.remove_edge(e);
                self.graph.add_edge(
                    src,
                    v,
                    Wire {
                        ty: *ty,
                        src_port: w.src_port,
                        tgt_port: port,
                    },
                );
                self.graph.add_edge(
                    v,
                    tgt,
                    Wire {
                        ty: *ty,
                        src_port: port,
                        tgt_port: w.tgt_port,
                    },
                );
            } else {
                // Boolean read from the value carried by the edge.
                if w.ty != WireType::Classical && w.ty != WireType::Boolean {
                    return Err(CircuitError::InvalidEdgeType {
                        edge: w.ty,
                        port: WireType::Boolean,
                    });
                }
                self.graph.add_edge(
                    src,
                    v,
                    Wire {
                        ty: WireType::Boolean,
                        src_port: w.src_port,
                        tgt_port: port,
                    },
                );
            }
        }
        Ok(())
    }

    /// Substitute a replacement circuit into a region.
    ///
    /// The replacement's boundary is matched slot-for-slot against the
    /// region, qubits first then bits; its global phase is added to the
    /// host's. On any mismatch the host is left unchanged.
    pub fn substitute(&mut self, replacement: &Circuit, sub: &Subcircuit) -> IrResult<()> {
        // ---- Validation (host untouched until it passes) ----
        if sub.in_edges.len() != sub.out_edges.len() {
            return Err(CircuitError::SubstitutionMismatch(format!(
                "{} in-edges vs {} out-edges",
                sub.in_edges.len(),
                sub.out_edges.len()
            )));
        }
        let rep_qubits = replacement.all_qubits();
        let rep_bits = replacement.all_bits();
        if !replacement.all_wasm_states().is_empty() {
            return Err(CircuitError::SubstitutionMismatch(
                "replacement with WASM wires is not supported".to_string(),
            ));
        }
        if replacement.has_implicit_wireswaps() {
            return Err(CircuitError::SubstitutionMismatch(
                "replacement has implicit wireswaps".to_string(),
            ));
        }
        let mut slot_units = Vec::new();
        slot_units.extend(rep_qubits.iter().cloned());
        slot_units.extend(rep_bits.iter().cloned());
        if slot_units.len() != sub.in_edges.len() {
            return Err(CircuitError::SubstitutionMismatch(format!(
                "replacement has {} wires, region has {}",
                slot_units.len(),
                sub.in_edges.len()
            )));
        }
        for (i, unit) in slot_units.iter().enumerate() {
            let expected = match unit.unit_type() {
                UnitType::Qubit => WireType::Quantum,
                _ => WireType::Classical,
            };
            if self.wire(sub.in_edges[i]).ty != expected
                || self.wire(sub.out_edges[i]).ty != expected
            {
                return Err(CircuitError::SubstitutionMismatch(format!(
                    "wire type mismatch at slot {i}"
                )));
            }
        }

        // ---- Capture host attachment points ----
        let interior: FxHashSet<NodeIndex> = sub.vertices.iter().copied().collect();
        let mut in_points = Vec::new(); // (src, src_port)
        let mut out_points = Vec::new(); // (tgt, tgt_port)
        let mut pending_readers: Vec<Vec<(NodeIndex, u32)>> = Vec::new();
        for (&e_in, &e_out) in sub.in_edges.iter().zip(&sub.out_edges) {
            let w_in = self.wire(e_in);
            let w_out = self.wire(e_out);
            in_points.push((self.source(e_in), w_in.src_port));
            out_points.push((self.target(e_out), w_out.tgt_port));
            // Exterior Boolean readers of the slot's final write follow
            // the new final writer.
            let mut readers = Vec::new();
            if w_out.ty == WireType::Classical {
                let writer = self.source(e_out);
                if interior.contains(&writer) {
                    for b in self.b_out_bundle(writer, w_out.src_port) {
                        let tgt = self.target(b);
                        if !interior.contains(&tgt) {
                            readers.push((tgt, self.wire(b).tgt_port));
                        }
                    }
                }
            }
            pending_readers.push(readers);
        }

        // ---- Delete the interior ----
        for &v in &interior {
            self.graph.remove_node(v);
        }
        // Single-edge holes survive vertex removal; clear them now.
        let mut cleared: FxHashSet<EdgeIndex> = FxHashSet::default();
        for &e in sub.in_edges.iter().chain(&sub.out_edges) {
            if cleared.insert(e) && self.graph.edge_weight(e).is_some() {
                self.graph.remove_edge(e);
            }
        }

        // ---- Copy the replacement ----
        let mut node_map: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        let mut slot_of_input: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut slot_of_output: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        for (i, unit) in slot_units.iter().enumerate() {
            let idx = replacement.unit_index[unit];
            slot_of_input.insert(replacement.boundary[idx].input, i);
            slot_of_output.insert(replacement.boundary[idx].output, i);
        }
        for v in replacement.graph.node_indices() {
            if replacement.graph[v].op.is_boundary() {
                continue;
            }
            let new = self.graph.add_node(Vertex {
                op: replacement.graph[v].op.clone(),
                opgroup: replacement.graph[v].opgroup.clone(),
            });
            node_map.insert(v, new);
        }
        for e in replacement.graph.edge_indices() {
            let (a, b) = replacement
                .graph
                .edge_endpoints(e)
                .expect("edge is live during iteration");
            let w = replacement.graph[e];
            let (src, src_port) = match slot_of_input.get(&a) {
                Some(&slot) => in_points[slot],
                None => (node_map[&a], w.src_port),
            };
            let (tgt, tgt_port) = match slot_of_output.get(&b) {
                Some(&slot) => out_points[slot],
                None => (node_map[&b], w.tgt_port),
            };
            self.graph.add_edge(
                src,
                tgt,
                Wire {
                    ty: w.ty,
                    src_port,
                    tgt_port,
                },
            );
        }

        // ---- Re-source exterior Boolean readers ----
        for (slot, readers) in pending_readers.into_iter().enumerate() {
            if readers.is_empty() {
                continue;
            }
            let (tgt, tgt_port) = out_points[slot];
            let final_edge = self.in_edge(tgt, tgt_port)?;
            let w = self.wire(final_edge);
            let writer = self.source(final_edge);
            for (reader, reader_port) in readers {
                self.graph.add_edge(
                    writer,
                    reader,
                    Wire {
                        ty: WireType::Boolean,
                        src_port: w.src_port,
                        tgt_port: reader_port,
                    },
                );
            }
        }

        self.add_phase(replacement.phase.clone());
        Ok(())
    }

    /// Splice `replacement` in place of every vertex whose op equals
    /// `op`. Returns the number of vertices replaced.
    pub fn substitute_all(&mut self, replacement: &Circuit, op: &Op) -> IrResult<usize> {
        let matches: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&v| !self.graph[v].op.is_boundary() && &self.graph[v].op == op)
            .collect();
        for &v in &matches {
            let sub = self.singleton_subcircuit(v)?;
            self.substitute(replacement, &sub)?;
        }
        Ok(matches.len())
    }

    /// Splice `replacement` in place of every vertex labelled with
    /// `opgroup`. Returns the number of vertices replaced.
    ///
    /// Fails with [`CircuitError::OpGroupCollision`] if the replacement
    /// carries an opgroup already present in the host outside the
    /// matched group; the host is unchanged in that case.
    pub fn substitute_named(&mut self, replacement: &Circuit, opgroup: &str) -> IrResult<usize> {
        let matches: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&v| self.graph[v].opgroup.as_deref() == Some(opgroup))
            .collect();
        if matches.is_empty() {
            return Ok(0);
        }
        // Opgroups used in the host outside the matched group.
        let host_groups: FxHashSet<String> = self
            .graph
            .node_indices()
            .filter(|v| !matches.contains(v))
            .filter_map(|v| self.graph[v].opgroup.clone())
            .collect();
        for v in replacement.graph.node_indices() {
            if let Some(g) = &replacement.graph[v].opgroup {
                if g != opgroup && host_groups.contains(g) {
                    return Err(CircuitError::OpGroupCollision(g.clone()));
                }
            }
        }
        for &v in &matches {
            let sub = self.singleton_subcircuit(v)?;
            self.substitute(replacement, &sub)?;
        }
        Ok(matches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpType;
    use alsvid_types::{Expr, UnitId};

    #[test]
    fn test_remove_vertex_rewires() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().cx(0, 1).unwrap().h(1).unwrap();
        let cx = circ
            .op_vertices()
            .into_iter()
            .find(|&v| circ.optype(v) == OpType::CX)
            .unwrap();
        circ.remove_vertex(cx, GraphRewiring::Yes, VertexDeletion::Yes)
            .unwrap();
        circ.verify_integrity().unwrap();
        assert_eq!(circ.n_gates(), 2);
        assert_eq!(circ.depth().unwrap(), 1);
    }

    #[test]
    fn test_detach_and_rewire_moves_vertex() {
        // Move an X gate from after a CX to before it on the same wire.
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap().x(0).unwrap();
        let x = circ
            .op_vertices()
            .into_iter()
            .find(|&v| circ.optype(v) == OpType::X)
            .unwrap();
        let cx = circ
            .op_vertices()
            .into_iter()
            .find(|&v| circ.optype(v) == OpType::CX)
            .unwrap();
        circ.remove_vertex(x, GraphRewiring::Yes, VertexDeletion::No)
            .unwrap();
        let before_cx = circ.in_edge(cx, 0).unwrap();
        circ.rewire(x, &[before_cx], &[WireType::Quantum]).unwrap();
        circ.verify_integrity().unwrap();
        let cmds = circ.commands().unwrap();
        assert_eq!(cmds[0].op.optype(), OpType::X);
        assert_eq!(cmds[1].op.optype(), OpType::CX);
    }

    #[test]
    fn test_substitute_single_gate() {
        // Replace a CX with a H-CZ-H implementation.
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap();
        let cx = circ.op_vertices()[0];
        let sub = circ.singleton_subcircuit(cx).unwrap();

        let mut repl = Circuit::with_size(2, 0);
        repl.h(1).unwrap().cz(0, 1).unwrap().h(1).unwrap();
        circ.substitute(&repl, &sub).unwrap();
        circ.verify_integrity().unwrap();
        assert_eq!(circ.count_gates(OpType::CX, false), 0);
        assert_eq!(circ.count_gates(OpType::CZ, false), 1);
        assert_eq!(circ.count_gates(OpType::H, false), 2);
    }

    #[test]
    fn test_substitute_propagates_phase() {
        let mut circ = Circuit::with_size(1, 0);
        circ.x(0).unwrap();
        let x = circ.op_vertices()[0];
        let sub = circ.singleton_subcircuit(x).unwrap();

        let mut repl = Circuit::with_size(1, 0);
        repl.rx(std::f64::consts::PI, 0).unwrap();
        repl.add_phase(Expr::constant(0.5));
        circ.substitute(&repl, &sub).unwrap();
        assert_eq!(circ.phase().eval(), Some(0.5));
    }

    #[test]
    fn test_substitute_mismatch_leaves_host_unchanged() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap();
        let cx = circ.op_vertices()[0];
        let sub = circ.singleton_subcircuit(cx).unwrap();

        let repl = Circuit::with_size(1, 0);
        let before = circ.clone();
        assert!(matches!(
            circ.substitute(&repl, &sub),
            Err(CircuitError::SubstitutionMismatch(_))
        ));
        assert_eq!(circ, before);
    }

    #[test]
    fn test_substitute_all() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().h(1).unwrap().cx(0, 1).unwrap();

        let mut repl = Circuit::with_size(1, 0);
        repl.rz(std::f64::consts::PI, 0)
            .unwrap()
            .rx(std::f64::consts::PI, 0)
            .unwrap();
        let n = circ
            .substitute_all(&repl, &Op::simple_gate(OpType::H))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(circ.count_gates(OpType::H, false), 0);
        assert_eq!(circ.count_gates(OpType::Rz, false), 2);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_substitute_named_collision() {
        let mut circ = Circuit::with_size(1, 0);
        let op = Op::simple_gate(OpType::H);
        circ.add_op(op.clone(), &[UnitId::default_qubit(0)], Some("g1".into()))
            .unwrap();
        circ.add_op(op, &[UnitId::default_qubit(0)], Some("g2".into()))
            .unwrap();

        let mut repl = Circuit::with_size(1, 0);
        repl.add_op(
            Op::simple_gate(OpType::X),
            &[UnitId::default_qubit(0)],
            Some("g2".into()),
        )
        .unwrap();
        assert!(matches!(
            circ.substitute_named(&repl, "g1"),
            Err(CircuitError::OpGroupCollision(_))
        ));
    }

    #[test]
    fn test_substitute_named_replaces_group() {
        let mut circ = Circuit::with_size(1, 0);
        let op = Op::simple_gate(OpType::H);
        circ.add_op(op.clone(), &[UnitId::default_qubit(0)], Some("g".into()))
            .unwrap();
        circ.add_op(op, &[UnitId::default_qubit(0)], Some("g".into()))
            .unwrap();

        let mut repl = Circuit::with_size(1, 0);
        repl.z(0).unwrap();
        let n = circ.substitute_named(&repl, "g").unwrap();
        assert_eq!(n, 2);
        assert_eq!(circ.count_gates(OpType::Z, false), 2);
        circ.verify_integrity().unwrap();
    }
}
