//! The DAG circuit representation.
//!
//! A circuit is a directed acyclic graph whose vertices carry operations
//! and whose edges carry typed wires with source/target port indices,
//! together with an insertion-ordered boundary of named units. Each unit
//! has an input and an output sentinel vertex; linear wires form a
//! unique path between them, and Boolean wires fan out read-only from
//! classical write ports.

mod build;
mod global;
mod perm;
mod rewrite;

pub use rewrite::{GraphRewiring, Subcircuit, VertexDeletion};

use petgraph::Direction;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use std::collections::HashSet;

use alsvid_types::{Expr, UnitId, UnitType};

use crate::error::{CircuitError, IrResult};
use crate::op::{Op, OpType};
use crate::wire::WireType;

/// Node index type for the circuit DAG.
pub type NodeIndex = petgraph::stable_graph::NodeIndex<u32>;
/// Edge index type for the circuit DAG.
pub type EdgeIndex = petgraph::stable_graph::EdgeIndex<u32>;

/// A vertex: an operation plus an optional opgroup label.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// The operation at this vertex.
    pub op: Op,
    /// Optional opgroup label for named substitution.
    pub opgroup: Option<String>,
}

/// An edge payload: wire type and the port indices it connects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire {
    /// The wire type.
    pub ty: WireType,
    /// Port index on the source vertex.
    pub src_port: u32,
    /// Port index on the target vertex.
    pub tgt_port: u32,
}

/// One boundary entry: a unit with its input and output sentinels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryEntry {
    /// The input sentinel vertex.
    pub input: NodeIndex,
    /// The output sentinel vertex.
    pub output: NodeIndex,
}

/// A quantum circuit as a typed-wire DAG with a named boundary.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Optional circuit name.
    pub(crate) name: Option<String>,
    /// Global phase, in radians.
    pub(crate) phase: Expr,
    /// The underlying graph. Stable indices survive vertex removal.
    pub(crate) graph: StableDiGraph<Vertex, Wire, u32>,
    /// Boundary units in insertion order.
    pub(crate) units: Vec<UnitId>,
    /// Per-unit boundary sentinels, keyed by position in `units`.
    pub(crate) boundary: Vec<BoundaryEntry>,
    /// Lookup from unit to its position in `units`.
    pub(crate) unit_index: FxHashMap<UnitId, usize>,
}

impl Circuit {
    /// Create an empty, unnamed circuit.
    pub fn new() -> Self {
        Self {
            name: None,
            phase: Expr::zero(),
            graph: StableDiGraph::default(),
            units: vec![],
            boundary: vec![],
            unit_index: FxHashMap::default(),
        }
    }

    /// Create a circuit with default-register qubits and bits.
    pub fn with_size(n_qubits: u32, n_bits: u32) -> Self {
        let mut circ = Self::new();
        for i in 0..n_qubits {
            circ.add_qubit(UnitId::default_qubit(i))
                .expect("fresh default qubits cannot clash");
        }
        for i in 0..n_bits {
            circ.add_bit(UnitId::default_bit(i))
                .expect("fresh default bits cannot clash");
        }
        circ
    }

    /// Set the circuit name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The circuit name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The global phase, in radians.
    pub fn phase(&self) -> &Expr {
        &self.phase
    }

    /// Add to the global phase.
    pub fn add_phase(&mut self, phase: impl Into<Expr>) {
        self.phase = (self.phase.clone() + phase.into()).simplify();
    }

    // =========================================================================
    // Units and registers
    // =========================================================================

    fn add_unit(&mut self, unit: UnitId) -> IrResult<()> {
        if self.unit_index.contains_key(&unit) {
            return Err(CircuitError::DuplicateUnit(unit));
        }
        for existing in &self.units {
            unit.check_register_shape(existing)
                .map_err(|_| CircuitError::DuplicateRegister(unit.reg_name().to_string()))?;
        }
        let (in_op, out_op, ty) = match unit.unit_type() {
            UnitType::Qubit => (Op::Input, Op::Output, WireType::Quantum),
            UnitType::Bit => (Op::ClInput, Op::ClOutput, WireType::Classical),
            UnitType::WasmState => (Op::WasmInput, Op::WasmOutput, WireType::Wasm),
        };
        let input = self.graph.add_node(Vertex {
            op: in_op,
            opgroup: None,
        });
        let output = self.graph.add_node(Vertex {
            op: out_op,
            opgroup: None,
        });
        self.graph.add_edge(
            input,
            output,
            Wire {
                ty,
                src_port: 0,
                tgt_port: 0,
            },
        );
        self.unit_index.insert(unit.clone(), self.units.len());
        self.units.push(unit);
        self.boundary.push(BoundaryEntry { input, output });
        Ok(())
    }

    /// Add a single qubit endpoint.
    pub fn add_qubit(&mut self, unit: UnitId) -> IrResult<()> {
        if unit.unit_type() != UnitType::Qubit {
            return Err(CircuitError::CircuitInvalidity(format!(
                "{unit} is not a qubit"
            )));
        }
        self.add_unit(unit)
    }

    /// Add a single bit endpoint.
    pub fn add_bit(&mut self, unit: UnitId) -> IrResult<()> {
        if unit.unit_type() != UnitType::Bit {
            return Err(CircuitError::CircuitInvalidity(format!(
                "{unit} is not a bit"
            )));
        }
        self.add_unit(unit)
    }

    /// Add a WASM-state wire endpoint.
    pub fn add_wasm_state(&mut self, unit: UnitId) -> IrResult<()> {
        if unit.unit_type() != UnitType::WasmState {
            return Err(CircuitError::CircuitInvalidity(format!(
                "{unit} is not a WASM state"
            )));
        }
        self.add_unit(unit)
    }

    /// Append a named quantum register of the given size.
    ///
    /// Fails with [`CircuitError::DuplicateRegister`] if any unit already
    /// uses the name, regardless of kind.
    pub fn add_q_register(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<UnitId>> {
        let name = name.into();
        self.check_register_free(&name)?;
        let mut ids = Vec::with_capacity(size as usize);
        for i in 0..size {
            let id = UnitId::qubit(name.clone(), i);
            self.add_unit(id.clone())?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Append a named classical register of the given size.
    pub fn add_c_register(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<UnitId>> {
        let name = name.into();
        self.check_register_free(&name)?;
        let mut ids = Vec::with_capacity(size as usize);
        for i in 0..size {
            let id = UnitId::bit(name.clone(), i);
            self.add_unit(id.clone())?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn check_register_free(&self, name: &str) -> IrResult<()> {
        if self.units.iter().any(|u| u.reg_name() == name) {
            return Err(CircuitError::DuplicateRegister(name.to_string()));
        }
        Ok(())
    }

    /// All units in insertion order.
    pub fn all_units(&self) -> &[UnitId] {
        &self.units
    }

    /// All qubits in insertion order.
    pub fn all_qubits(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.unit_type() == UnitType::Qubit)
            .cloned()
            .collect()
    }

    /// All bits in insertion order.
    pub fn all_bits(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.unit_type() == UnitType::Bit)
            .cloned()
            .collect()
    }

    /// All WASM-state wires in insertion order.
    pub fn all_wasm_states(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.unit_type() == UnitType::WasmState)
            .cloned()
            .collect()
    }

    /// Number of qubits.
    pub fn n_qubits(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.unit_type() == UnitType::Qubit)
            .count()
    }

    /// Number of bits.
    pub fn n_bits(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.unit_type() == UnitType::Bit)
            .count()
    }

    /// True iff the unit is declared in the boundary.
    pub fn contains_unit(&self, unit: &UnitId) -> bool {
        self.unit_index.contains_key(unit)
    }

    /// The input sentinel vertex of a unit.
    pub fn get_in(&self, unit: &UnitId) -> IrResult<NodeIndex> {
        self.unit_index
            .get(unit)
            .map(|&i| self.boundary[i].input)
            .ok_or_else(|| CircuitError::UnitNotFound {
                unit: unit.clone(),
                op: None,
            })
    }

    /// The output sentinel vertex of a unit.
    pub fn get_out(&self, unit: &UnitId) -> IrResult<NodeIndex> {
        self.unit_index
            .get(unit)
            .map(|&i| self.boundary[i].output)
            .ok_or_else(|| CircuitError::UnitNotFound {
                unit: unit.clone(),
                op: None,
            })
    }

    // =========================================================================
    // Graph accessors
    // =========================================================================

    /// The operation at a vertex.
    pub fn op(&self, v: NodeIndex) -> &Op {
        &self.graph[v].op
    }

    /// The operation tag at a vertex.
    pub fn optype(&self, v: NodeIndex) -> OpType {
        self.graph[v].op.optype()
    }

    /// The opgroup label at a vertex.
    pub fn opgroup(&self, v: NodeIndex) -> Option<&str> {
        self.graph[v].opgroup.as_deref()
    }

    /// Total number of vertices, boundary sentinels included.
    pub fn n_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of non-boundary (operation) vertices.
    pub fn n_gates(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&v| !self.graph[v].op.is_boundary())
            .count()
    }

    /// All operation vertices, in index order.
    pub fn op_vertices(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&v| !self.graph[v].op.is_boundary())
            .collect()
    }

    /// Source vertex of an edge.
    pub fn source(&self, e: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(e)
            .expect("edge index must be live")
            .0
    }

    /// Target vertex of an edge.
    pub fn target(&self, e: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(e)
            .expect("edge index must be live")
            .1
    }

    /// The wire payload of an edge.
    pub fn wire(&self, e: EdgeIndex) -> Wire {
        self.graph[e]
    }

    /// All in-edges of a vertex, ordered by target port.
    pub fn in_edges(&self, v: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(v, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        edges.sort_by_key(|&e| (self.graph[e].tgt_port, e.index()));
        edges
    }

    /// All linear out-edges of a vertex, ordered by source port.
    pub fn out_edges(&self, v: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(v, Direction::Outgoing)
            .filter(|e| e.weight().ty.is_linear())
            .map(|e| e.id())
            .collect();
        edges.sort_by_key(|&e| (self.graph[e].src_port, e.index()));
        edges
    }

    /// The unique in-edge at a port.
    pub fn in_edge(&self, v: NodeIndex, port: u32) -> IrResult<EdgeIndex> {
        self.graph
            .edges_directed(v, Direction::Incoming)
            .find(|e| e.weight().tgt_port == port)
            .map(|e| e.id())
            .ok_or_else(|| {
                CircuitError::CircuitInvalidity(format!("no in-edge at port {port} of {v:?}"))
            })
    }

    /// The unique linear out-edge at a port.
    pub fn out_edge(&self, v: NodeIndex, port: u32) -> IrResult<EdgeIndex> {
        self.graph
            .edges_directed(v, Direction::Outgoing)
            .find(|e| e.weight().src_port == port && e.weight().ty.is_linear())
            .map(|e| e.id())
            .ok_or_else(|| {
                CircuitError::CircuitInvalidity(format!("no out-edge at port {port} of {v:?}"))
            })
    }

    /// The Boolean out-edges (read fan-out) at a port, in a stable order.
    pub fn b_out_bundle(&self, v: NodeIndex, port: u32) -> Vec<EdgeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(v, Direction::Outgoing)
            .filter(|e| e.weight().src_port == port && e.weight().ty == WireType::Boolean)
            .map(|e| e.id())
            .collect();
        edges.sort_by_key(|e| e.index());
        edges
    }

    /// Follow a wire through a vertex: the out-edge at the same port as
    /// the given in-edge.
    pub fn next_edge(&self, v: NodeIndex, in_edge: EdgeIndex) -> IrResult<EdgeIndex> {
        self.out_edge(v, self.graph[in_edge].tgt_port)
    }

    /// Follow a wire backwards through a vertex.
    pub fn prev_edge(&self, v: NodeIndex, out_edge: EdgeIndex) -> IrResult<EdgeIndex> {
        self.in_edge(v, self.graph[out_edge].src_port)
    }

    /// The current final linear edge of a unit: the edge into its output
    /// sentinel.
    pub fn final_edge(&self, unit: &UnitId) -> IrResult<EdgeIndex> {
        let out = self.get_out(unit)?;
        self.in_edge(out, 0)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Count vertices whose tag equals `optype`. With
    /// `include_conditional`, conditionals wrapping a matching inner op
    /// are counted too.
    pub fn count_gates(&self, optype: OpType, include_conditional: bool) -> usize {
        self.graph
            .node_indices()
            .filter(|&v| {
                let op = &self.graph[v].op;
                if op.optype() == optype {
                    return true;
                }
                if include_conditional {
                    if let Op::Conditional(c) = op {
                        return c.op.optype() == optype;
                    }
                }
                false
            })
            .count()
    }

    /// Count vertices acting on exactly two qubits, excluding barriers.
    pub fn count_2q_gates(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&v| {
                let op = &self.graph[v].op;
                !op.is_boundary() && op.optype() != OpType::Barrier && op.n_qubits() == 2
            })
            .count()
    }

    /// All free symbols in vertex parameters and the global phase.
    pub fn free_symbols(&self) -> HashSet<String> {
        let mut set = self.phase.free_symbols();
        for v in self.graph.node_indices() {
            set.extend(self.graph[v].op.free_symbols());
        }
        set
    }

    /// True iff the circuit contains any symbolic parameter.
    pub fn is_symbolic(&self) -> bool {
        !self.free_symbols().is_empty()
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Verify the structural invariants of the DAG.
    ///
    /// Checks acyclicity, port saturation and type agreement against each
    /// vertex signature, and linear-path continuity from every input
    /// sentinel to its output sentinel.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(CircuitError::CircuitInvalidity(
                "graph contains a cycle".to_string(),
            ));
        }

        for v in self.graph.node_indices() {
            let op = &self.graph[v].op;
            let sig = op.signature();
            if op.is_boundary() {
                continue;
            }
            for (port, ty) in sig.iter().enumerate() {
                let port = port as u32;
                let ins: Vec<_> = self
                    .graph
                    .edges_directed(v, Direction::Incoming)
                    .filter(|e| e.weight().tgt_port == port)
                    .collect();
                if ins.len() != 1 {
                    return Err(CircuitError::CircuitInvalidity(format!(
                        "port {port} of {v:?} has {} in-edges",
                        ins.len()
                    )));
                }
                if ins[0].weight().ty != *ty {
                    return Err(CircuitError::InvalidEdgeType {
                        edge: ins[0].weight().ty,
                        port: *ty,
                    });
                }
                if ty.is_linear() {
                    let outs: Vec<_> = self
                        .graph
                        .edges_directed(v, Direction::Outgoing)
                        .filter(|e| e.weight().src_port == port && e.weight().ty.is_linear())
                        .collect();
                    if outs.len() != 1 {
                        return Err(CircuitError::CircuitInvalidity(format!(
                            "linear port {port} of {v:?} has {} out-edges",
                            outs.len()
                        )));
                    }
                    if outs[0].weight().ty != *ty {
                        return Err(CircuitError::InvalidEdgeType {
                            edge: outs[0].weight().ty,
                            port: *ty,
                        });
                    }
                }
            }
        }

        // Path continuity: every unit's wire reaches its own output.
        for (i, unit) in self.units.iter().enumerate() {
            let entry = self.boundary[i];
            let mut edge = self.out_edge(entry.input, 0)?;
            let mut steps = 0usize;
            loop {
                let tgt = self.target(edge);
                if tgt == entry.output {
                    break;
                }
                if self.graph[tgt].op.is_boundary() {
                    // Reaching some other output sentinel is an implicit
                    // wireswap, legal for qubits only.
                    if unit.unit_type() == UnitType::Qubit
                        && self.graph[tgt].op.optype() == OpType::Output
                    {
                        break;
                    }
                    return Err(CircuitError::CircuitInvalidity(format!(
                        "wire of {unit} ends at a foreign boundary"
                    )));
                }
                edge = self.next_edge(tgt, edge)?;
                steps += 1;
                if steps > self.graph.edge_count() {
                    return Err(CircuitError::CircuitInvalidity(format!(
                        "wire of {unit} does not terminate"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equivalence: units, phase, command stream and implicit
/// permutation all agree. Names are ignored.
impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        if self.units != other.units || self.phase != other.phase {
            return false;
        }
        if self.implicit_qubit_permutation() != other.implicit_qubit_permutation() {
            return false;
        }
        match (self.commands(), other.commands()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
