//! Lazy layered-frontier traversal of circuits.
//!
//! A *cut* is a maximal antichain of vertices whose inputs all lie in
//! the current frontier, together with the advanced frontier itself.
//! The unit frontier holds each unit's next linear edge; the Boolean
//! frontier holds, per bit, the unresolved read edges emitted by the
//! last write of that bit.

use rustc_hash::FxHashSet;

use alsvid_types::{UnitId, UnitType};

use crate::circuit::{Circuit, EdgeIndex, NodeIndex};
use crate::error::{CircuitError, IrResult};
use crate::op::Op;
use crate::wire::WireType;

/// One layer of concurrent vertices.
pub type Slice = Vec<NodeIndex>;

/// Ordered unit frontier: each unit's current linear edge.
pub type UnitFrontier = Vec<(UnitId, EdgeIndex)>;

/// Ordered Boolean frontier: per bit, the pending read edges.
pub type BoolFrontier = Vec<(UnitId, Vec<EdgeIndex>)>;

/// A cut through the DAG: a slice and the frontier beyond it.
#[derive(Debug, Clone, Default)]
pub struct CutFrontier {
    /// The emitted slice.
    pub slice: Slice,
    /// Unit frontier after the slice.
    pub u_frontier: UnitFrontier,
    /// Boolean frontier after the slice.
    pub b_frontier: BoolFrontier,
}

fn frontier_get<'f>(frontier: &'f BoolFrontier, unit: &UnitId) -> Option<&'f Vec<EdgeIndex>> {
    frontier.iter().find(|(u, _)| u == unit).map(|(_, es)| es)
}

impl Circuit {
    /// Compute the next cut from a frontier.
    ///
    /// If `skip` is provided, vertices satisfying it are folded into the
    /// frontier greedily before the slice is formed, so the emitted
    /// slice contains no skipped vertices.
    pub fn next_cut(
        &self,
        u_frontier: &UnitFrontier,
        b_frontier: &BoolFrontier,
        skip: Option<&dyn Fn(&Op) -> bool>,
    ) -> IrResult<CutFrontier> {
        let mut u_frontier = u_frontier.clone();
        let mut b_frontier = b_frontier.clone();

        if let Some(skip) = skip {
            loop {
                let (all_edges, edge_lookup) = self.frontier_edges(&u_frontier, &b_frontier);
                let mut skip_slice: FxHashSet<NodeIndex> = FxHashSet::default();
                for &e in &all_edges {
                    let v = self.target(e);
                    if self.op(v).is_boundary() || !skip(self.op(v)) || skip_slice.contains(&v) {
                        continue;
                    }
                    if self
                        .in_edges(v)
                        .iter()
                        .all(|in_e| edge_lookup.contains(in_e))
                    {
                        skip_slice.insert(v);
                    }
                }
                if skip_slice.is_empty() {
                    break;
                }
                b_frontier = self.advance_b_frontier(&b_frontier, &u_frontier, &skip_slice)?;
                u_frontier = self.advance_u_frontier(&u_frontier, &skip_slice)?;
            }
        }

        let (all_edges, edge_lookup) = self.frontier_edges(&u_frontier, &b_frontier);
        let mut slice = Slice::new();
        let mut slice_lookup: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut bad: FxHashSet<NodeIndex> = FxHashSet::default();
        for &e in &all_edges {
            let v = self.target(e);
            if self.op(v).is_boundary() || slice_lookup.contains(&v) || bad.contains(&v) {
                continue;
            }
            if self
                .in_edges(v)
                .iter()
                .all(|in_e| edge_lookup.contains(in_e))
            {
                slice_lookup.insert(v);
                slice.push(v);
            } else {
                bad.insert(v);
            }
        }

        let next_b = self.advance_b_frontier(&b_frontier, &u_frontier, &slice_lookup)?;
        let next_u = self.advance_u_frontier(&u_frontier, &slice_lookup)?;
        Ok(CutFrontier {
            slice,
            u_frontier: next_u,
            b_frontier: next_b,
        })
    }

    /// Collect the candidate edges of a frontier.
    ///
    /// A bit's linear edge is withheld while it still has pending readers
    /// at other vertices, so the next write cannot overtake them.
    fn frontier_edges(
        &self,
        u_frontier: &UnitFrontier,
        b_frontier: &BoolFrontier,
    ) -> (Vec<EdgeIndex>, FxHashSet<EdgeIndex>) {
        let mut all_edges = Vec::new();
        for (unit, e) in u_frontier {
            if unit.unit_type() == UnitType::Bit {
                let targ = self.target(*e);
                if let Some(reads) = frontier_get(b_frontier, unit) {
                    if reads.iter().any(|r| self.target(*r) != targ) {
                        continue;
                    }
                }
            }
            all_edges.push(*e);
        }
        for (_, reads) in b_frontier {
            all_edges.extend(reads.iter().copied());
        }
        let lookup = all_edges.iter().copied().collect();
        (all_edges, lookup)
    }

    fn advance_u_frontier(
        &self,
        u_frontier: &UnitFrontier,
        slice: &FxHashSet<NodeIndex>,
    ) -> IrResult<UnitFrontier> {
        let mut next = Vec::with_capacity(u_frontier.len());
        for (unit, e) in u_frontier {
            let v = self.target(*e);
            if slice.contains(&v) {
                next.push((unit.clone(), self.next_edge(v, *e)?));
            } else {
                next.push((unit.clone(), *e));
            }
        }
        Ok(next)
    }

    fn advance_b_frontier(
        &self,
        b_frontier: &BoolFrontier,
        u_frontier: &UnitFrontier,
        slice: &FxHashSet<NodeIndex>,
    ) -> IrResult<BoolFrontier> {
        let mut next: BoolFrontier = Vec::new();
        // Reads not consumed by this slice stay pending.
        for (bit, reads) in b_frontier {
            let remaining: Vec<EdgeIndex> = reads
                .iter()
                .copied()
                .filter(|r| !slice.contains(&self.target(*r)))
                .collect();
            if !remaining.is_empty() {
                next.push((bit.clone(), remaining));
            }
        }
        // New writes in this slice publish their Boolean read bundles.
        for (unit, e) in u_frontier {
            if self.wire(*e).ty != WireType::Classical {
                continue;
            }
            let v = self.target(*e);
            if !slice.contains(&v) {
                continue;
            }
            if frontier_get(&next, unit).is_some() {
                return Err(CircuitError::RawHazard(unit.clone()));
            }
            let port = self.wire(*e).tgt_port;
            let reads = self.b_out_bundle(v, port);
            if !reads.is_empty() {
                next.push((unit.clone(), reads));
            }
        }
        Ok(next)
    }

    /// An iterator over the slices of this circuit.
    pub fn slices(&self) -> SliceIterator<'_> {
        SliceIterator::new(self, None)
    }

    /// An iterator over the slices of this circuit, folding vertices for
    /// which `skip` holds into the frontier.
    pub fn slices_with_skip<'c>(&'c self, skip: &'c dyn Fn(&Op) -> bool) -> SliceIterator<'c> {
        SliceIterator::new(self, Some(skip))
    }

    /// Circuit depth: the number of non-empty slices, with barriers
    /// ignored.
    pub fn depth(&self) -> IrResult<usize> {
        let skip = |op: &Op| op.optype() == crate::op::OpType::Barrier;
        self.count_slices(&skip)
    }

    /// Depth counting only slices that contain an op whose tag is in
    /// `types`.
    pub fn depth_by_types(&self, types: &[crate::op::OpType]) -> IrResult<usize> {
        let skip = |op: &Op| !types.contains(&op.optype());
        self.count_slices(&skip)
    }

    /// Depth counting only slices containing a two-qubit non-barrier op.
    pub fn depth_2q(&self) -> IrResult<usize> {
        let skip = |op: &Op| {
            op.optype() == crate::op::OpType::Barrier || op.n_qubits() != 2
        };
        self.count_slices(&skip)
    }

    fn count_slices(&self, skip: &dyn Fn(&Op) -> bool) -> IrResult<usize> {
        let mut n = 0;
        for slice in self.slices_with_skip(skip) {
            let slice = slice?;
            if !slice.is_empty() {
                n += 1;
            }
        }
        Ok(n)
    }
}

/// Lazy slice iterator.
///
/// Borrows the circuit read-only; any mutation invalidates it. The
/// first yielded slice additionally contains every zero-arity vertex
/// (operations with no wires, such as `Phase`).
pub struct SliceIterator<'c> {
    circ: &'c Circuit,
    cut: CutFrontier,
    prev_b_frontier: BoolFrontier,
    skip: Option<&'c dyn Fn(&Op) -> bool>,
    pending_error: Option<CircuitError>,
}

impl<'c> SliceIterator<'c> {
    fn new(circ: &'c Circuit, skip: Option<&'c dyn Fn(&Op) -> bool>) -> Self {
        let mut u_frontier = UnitFrontier::new();
        let mut b_frontier = BoolFrontier::new();
        for (i, unit) in circ.units.iter().enumerate() {
            let input = circ.boundary[i].input;
            let first = circ
                .out_edge(input, 0)
                .expect("boundary input always has one out-edge");
            u_frontier.push((unit.clone(), first));
            if unit.unit_type() == UnitType::Bit {
                let reads = circ.b_out_bundle(input, 0);
                if !reads.is_empty() {
                    b_frontier.push((unit.clone(), reads));
                }
            }
        }

        let prev_b_frontier = b_frontier.clone();
        let mut pending_error = None;
        let mut cut = match circ.next_cut(&u_frontier, &b_frontier, skip) {
            Ok(cut) => cut,
            Err(e) => {
                pending_error = Some(e);
                CutFrontier::default()
            }
        };

        // Zero-arity vertices belong to the first slice.
        if pending_error.is_none() && skip.is_none() {
            for v in circ.graph.node_indices() {
                let op = &circ.graph[v].op;
                if !op.is_boundary() && op.signature().is_empty() {
                    cut.slice.push(v);
                }
            }
        }

        Self {
            circ,
            cut,
            prev_b_frontier,
            skip,
            pending_error,
        }
    }

    /// The unit frontier after the current slice.
    pub fn u_frontier(&self) -> &UnitFrontier {
        &self.cut.u_frontier
    }

    /// The Boolean frontier after the current slice.
    pub fn b_frontier(&self) -> &BoolFrontier {
        &self.cut.b_frontier
    }

    /// The Boolean frontier before the current slice.
    pub fn prev_b_frontier(&self) -> &BoolFrontier {
        &self.prev_b_frontier
    }

    /// True once every unit frontier edge rests on a final boundary
    /// vertex and no Boolean reads are pending.
    pub fn finished(&self) -> bool {
        self.cut
            .u_frontier
            .iter()
            .all(|(_, e)| self.circ.op(self.circ.target(*e)).is_boundary())
            && self.cut.b_frontier.iter().all(|(_, es)| es.is_empty())
    }

    /// Advance and return the next slice, with access to the surrounding
    /// frontier retained on `self`.
    pub fn next_slice(&mut self) -> Option<IrResult<Slice>> {
        if let Some(e) = self.pending_error.take() {
            return Some(Err(e));
        }
        if self.cut.slice.is_empty() {
            return None;
        }
        let out = self.cut.slice.clone();
        self.prev_b_frontier = self.cut.b_frontier.clone();
        match self
            .circ
            .next_cut(&self.cut.u_frontier, &self.cut.b_frontier, self.skip)
        {
            Ok(cut) => self.cut = cut,
            Err(e) => self.pending_error = Some(e),
        }
        Some(Ok(out))
    }
}

impl Iterator for SliceIterator<'_> {
    type Item = IrResult<Slice>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpType;

    #[test]
    fn test_cx_chain_slicing() {
        let mut circ = Circuit::with_size(3, 0);
        circ.cx(0, 1).unwrap().cx(1, 2).unwrap();
        let slices: Vec<_> = circ.slices().map(Result::unwrap).collect();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].len(), 1);
        assert_eq!(slices[1].len(), 1);
        assert_eq!(circ.depth().unwrap(), 2);
        assert_eq!(circ.depth_by_types(&[OpType::CX]).unwrap(), 2);
        assert_eq!(circ.depth_2q().unwrap(), 2);
    }

    #[test]
    fn test_parallel_ops_share_slice() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().h(1).unwrap();
        assert_eq!(circ.depth().unwrap(), 1);
    }

    #[test]
    fn test_barrier_skipped_in_depth() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap();
        circ.add_barrier(
            &[
                alsvid_types::UnitId::default_qubit(0),
                alsvid_types::UnitId::default_qubit(1),
            ],
            None,
        )
        .unwrap();
        circ.h(1).unwrap();
        // Barrier separates the two H's but contributes no depth itself.
        assert_eq!(circ.depth().unwrap(), 2);
    }

    #[test]
    fn test_depth_by_types_filters() {
        let mut circ = Circuit::with_size(2, 0);
        circ.h(0).unwrap().cx(0, 1).unwrap().h(1).unwrap();
        assert_eq!(circ.depth().unwrap(), 3);
        assert_eq!(circ.depth_by_types(&[OpType::CX]).unwrap(), 1);
        assert_eq!(circ.depth_by_types(&[OpType::H]).unwrap(), 2);
    }

    #[test]
    fn test_slicing_is_deterministic() {
        let mut circ = Circuit::with_size(3, 0);
        circ.h(0).unwrap().cx(0, 1).unwrap().cx(1, 2).unwrap();
        let a: Vec<_> = circ.slices().map(Result::unwrap).collect();
        let b: Vec<_> = circ.slices().map(Result::unwrap).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_conditional_read_ordering() {
        // A measure writes c[0]; a conditional X reads it. The reader
        // must appear strictly after the writer's slice.
        let mut circ = Circuit::with_size(2, 1);
        circ.measure(0, 0).unwrap();
        circ.add_conditional_gate(
            OpType::X,
            vec![],
            &[alsvid_types::UnitId::default_qubit(1)],
            &[alsvid_types::UnitId::default_bit(0)],
            1,
        )
        .unwrap();
        let slices: Vec<_> = circ.slices().map(Result::unwrap).collect();
        assert_eq!(slices.len(), 2);
    }

    #[test]
    fn test_finished_on_empty() {
        let circ = Circuit::with_size(2, 0);
        let mut it = circ.slices();
        assert!(it.next().is_none());
        assert!(it.finished());
    }
}
