//! Implicit qubit permutations: SWAP elision and reification.

use rustc_hash::FxHashMap;

use alsvid_types::{UnitId, UnitType};

use crate::circuit::{Circuit, NodeIndex, Vertex, Wire};
use crate::error::{CircuitError, IrResult};
use crate::op::{Op, OpType};
use crate::wire::WireType;

impl Circuit {
    /// Map each output sentinel vertex back to its unit.
    fn output_owner(&self) -> FxHashMap<NodeIndex, UnitId> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (self.boundary[i].output, u.clone()))
            .collect()
    }

    /// The implicit qubit permutation: for each qubit `u`, the unit
    /// whose output sentinel the wire starting at `in(u)` reaches.
    ///
    /// Identity for circuits without elided SWAPs.
    pub fn implicit_qubit_permutation(&self) -> Vec<(UnitId, UnitId)> {
        let owners = self.output_owner();
        let mut perm = Vec::new();
        for (i, unit) in self.units.iter().enumerate() {
            if unit.unit_type() != UnitType::Qubit {
                continue;
            }
            let mut edge = self
                .out_edge(self.boundary[i].input, 0)
                .expect("boundary input has one out-edge");
            loop {
                let v = self.target(edge);
                if let Some(owner) = owners.get(&v) {
                    perm.push((unit.clone(), owner.clone()));
                    break;
                }
                edge = self
                    .next_edge(v, edge)
                    .expect("linear wires continue through every vertex");
            }
        }
        perm
    }

    /// True iff the implicit permutation is not the identity.
    pub fn has_implicit_wireswaps(&self) -> bool {
        self.implicit_qubit_permutation()
            .iter()
            .any(|(a, b)| a != b)
    }

    /// Remove every quantum SWAP vertex by crossing its wires, folding
    /// the swap into the implicit output permutation. Returns the number
    /// of SWAPs elided.
    pub fn replace_swaps(&mut self) -> IrResult<usize> {
        let swaps: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&v| self.graph[v].op.optype() == OpType::Swap)
            .collect();
        for &v in &swaps {
            let in0 = self.in_edge(v, 0)?;
            let in1 = self.in_edge(v, 1)?;
            let out0 = self.out_edge(v, 0)?;
            let out1 = self.out_edge(v, 1)?;
            let (s0, w_in0) = (self.source(in0), self.wire(in0));
            let (s1, w_in1) = (self.source(in1), self.wire(in1));
            let (t0, w_out0) = (self.target(out0), self.wire(out0));
            let (t1, w_out1) = (self.target(out1), self.wire(out1));
            self.graph.remove_node(v);
            // Cross: wire entering port 0 continues along port 1's exit.
            self.graph.add_edge(
                s0,
                t1,
                Wire {
                    ty: WireType::Quantum,
                    src_port: w_in0.src_port,
                    tgt_port: w_out1.tgt_port,
                },
            );
            self.graph.add_edge(
                s1,
                t0,
                Wire {
                    ty: WireType::Quantum,
                    src_port: w_in1.src_port,
                    tgt_port: w_out0.tgt_port,
                },
            );
        }
        Ok(swaps.len())
    }

    /// Eliminate the implicit permutation by appending explicit SWAP
    /// vertices at the output boundary, one per transposition of the
    /// cycle decomposition (`n_qubits − #cycles` SWAPs in total).
    pub fn replace_all_implicit_wire_swaps(&mut self) -> IrResult<usize> {
        let mut added = 0usize;
        loop {
            // Boundary order keeps the SWAP insertion deterministic.
            let perm = self.implicit_qubit_permutation();
            let Some((u, v)) = perm.into_iter().find(|(a, b)| a != b) else {
                break;
            };
            // Path of `u` currently ends at out(v); some other path ends
            // at out(u). Route both through an explicit SWAP so `u`
            // terminates at its own output.
            let e_at_u = self.final_edge(&u)?;
            let e_at_v = self.final_edge(&v)?;
            let out_u = self.get_out(&u)?;
            let out_v = self.get_out(&v)?;
            let (src_other, w_other) = (self.source(e_at_u), self.wire(e_at_u));
            let (src_u, w_u) = (self.source(e_at_v), self.wire(e_at_v));
            self.graph.remove_edge(e_at_u);
            self.graph.remove_edge(e_at_v);
            let s = self.graph.add_node(Vertex {
                op: Op::simple_gate(OpType::Swap),
                opgroup: None,
            });
            self.graph.add_edge(
                src_u,
                s,
                Wire {
                    ty: WireType::Quantum,
                    src_port: w_u.src_port,
                    tgt_port: 0,
                },
            );
            self.graph.add_edge(
                src_other,
                s,
                Wire {
                    ty: WireType::Quantum,
                    src_port: w_other.src_port,
                    tgt_port: 1,
                },
            );
            self.graph.add_edge(
                s,
                out_u,
                Wire {
                    ty: WireType::Quantum,
                    src_port: 0,
                    tgt_port: 0,
                },
            );
            self.graph.add_edge(
                s,
                out_v,
                Wire {
                    ty: WireType::Quantum,
                    src_port: 1,
                    tgt_port: 0,
                },
            );
            added += 1;
        }
        Ok(added)
    }

    /// Impose an implicit permutation on a permutation-free circuit by
    /// re-targeting its final quantum edges. Used when reconstructing
    /// serialized circuits.
    pub(crate) fn set_implicit_permutation(
        &mut self,
        pairs: &[(UnitId, UnitId)],
    ) -> IrResult<()> {
        if self.has_implicit_wireswaps() {
            return Err(CircuitError::CircuitInvalidity(
                "circuit already has an implicit permutation".to_string(),
            ));
        }
        let mut finals = Vec::new();
        for (u, v) in pairs {
            if u.unit_type() != UnitType::Qubit || v.unit_type() != UnitType::Qubit {
                return Err(CircuitError::CircuitInvalidity(
                    "implicit permutation must map qubits to qubits".to_string(),
                ));
            }
            let e = self.final_edge(u)?;
            finals.push((self.source(e), self.wire(e), self.get_out(v)?, e));
        }
        for (_, _, _, e) in &finals {
            self.graph.remove_edge(*e);
        }
        for (src, w, out, _) in finals {
            self.graph.add_edge(
                src,
                out,
                Wire {
                    ty: WireType::Quantum,
                    src_port: w.src_port,
                    tgt_port: 0,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_swaps_creates_permutation() {
        let mut circ = Circuit::with_size(2, 0);
        circ.swap(0, 1).unwrap();
        assert_eq!(circ.replace_swaps().unwrap(), 1);
        circ.verify_integrity().unwrap();
        assert!(circ.has_implicit_wireswaps());
        let perm = circ.implicit_qubit_permutation();
        assert!(perm.contains(&(UnitId::default_qubit(0), UnitId::default_qubit(1))));
        assert!(perm.contains(&(UnitId::default_qubit(1), UnitId::default_qubit(0))));
    }

    #[test]
    fn test_reify_implicit_permutation() {
        let mut circ = Circuit::with_size(2, 0);
        circ.swap(0, 1).unwrap();
        circ.replace_swaps().unwrap();
        let added = circ.replace_all_implicit_wire_swaps().unwrap();
        assert_eq!(added, 1);
        assert!(!circ.has_implicit_wireswaps());
        assert_eq!(circ.count_gates(OpType::Swap, false), 1);
        circ.verify_integrity().unwrap();
    }

    #[test]
    fn test_three_cycle_needs_two_swaps() {
        // SWAP(0,1); SWAP(1,2) elided gives a 3-cycle: reification needs
        // n − #cycles = 3 − 1 = 2 SWAPs.
        let mut circ = Circuit::with_size(3, 0);
        circ.swap(0, 1).unwrap().swap(1, 2).unwrap();
        circ.replace_swaps().unwrap();
        assert!(circ.has_implicit_wireswaps());
        let added = circ.replace_all_implicit_wire_swaps().unwrap();
        assert_eq!(added, 2);
        assert!(!circ.has_implicit_wireswaps());
    }

    #[test]
    fn test_identity_permutation_no_swaps_added() {
        let mut circ = Circuit::with_size(2, 0);
        circ.cx(0, 1).unwrap();
        assert!(!circ.has_implicit_wireswaps());
        assert_eq!(circ.replace_all_implicit_wire_swaps().unwrap(), 0);
    }
}
