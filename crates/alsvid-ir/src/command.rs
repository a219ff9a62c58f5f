//! Command view: vertices paired with their unit arguments.

use std::fmt;

use alsvid_types::UnitId;

use crate::circuit::{Circuit, EdgeIndex, NodeIndex};
use crate::error::{CircuitError, IrResult};
use crate::op::Op;
use crate::wire::WireType;

/// A vertex together with the ordered units at its position.
///
/// Arguments follow the operation's signature order: linear wires carry
/// the unit whose path passes through the port, Boolean wires carry the
/// controlling bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The operation.
    pub op: Op,
    /// Ordered argument units.
    pub args: Vec<UnitId>,
    /// Optional opgroup label.
    pub opgroup: Option<String>,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.op.optype())?;
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, " {}", args.join(", "))
    }
}

impl Circuit {
    /// The deterministic command stream of the circuit.
    ///
    /// Order is slice order, breaking ties by vertex discovery order
    /// within each slice.
    pub fn commands(&self) -> IrResult<Vec<Command>> {
        let mut commands = Vec::new();
        let mut it = self.slices();
        loop {
            // Frontiers surrounding the slice about to be emitted: the
            // unit frontier just beyond it and the Boolean frontier just
            // before it.
            let u_after = it.u_frontier().clone();
            let prev_b = it.prev_b_frontier().clone();
            let Some(slice) = it.next_slice() else {
                break;
            };
            for v in slice? {
                commands.push(self.command_for_vertex(v, &u_after, &prev_b)?);
            }
        }
        Ok(commands)
    }

    /// Recover the argument units of a slice vertex from the frontier
    /// just beyond its slice and the Boolean frontier that preceded it.
    pub(crate) fn command_for_vertex(
        &self,
        v: NodeIndex,
        u_after: &[(UnitId, EdgeIndex)],
        prev_b: &[(UnitId, Vec<EdgeIndex>)],
    ) -> IrResult<Command> {
        let op = self.op(v).clone();
        let sig = op.signature();
        let mut args = Vec::with_capacity(sig.len());
        for (port, ty) in sig.iter().enumerate() {
            let port = port as u32;
            if ty.is_linear() {
                let unit = u_after
                    .iter()
                    .find(|(_, e)| self.source(*e) == v && self.wire(*e).src_port == port)
                    .map(|(u, _)| u.clone());
                match unit {
                    Some(u) => args.push(u),
                    None => {
                        return Err(CircuitError::CircuitInvalidity(format!(
                            "no frontier unit for port {port} of {v:?}"
                        )));
                    }
                }
            } else {
                debug_assert_eq!(*ty, WireType::Boolean);
                let bit = prev_b
                    .iter()
                    .find(|(_, reads)| {
                        reads
                            .iter()
                            .any(|e| self.target(*e) == v && self.wire(*e).tgt_port == port)
                    })
                    .map(|(b, _)| b.clone());
                match bit {
                    Some(b) => args.push(b),
                    None => {
                        return Err(CircuitError::CircuitInvalidity(format!(
                            "no controlling bit for Boolean port {port} of {v:?}"
                        )));
                    }
                }
            }
        }
        Ok(Command {
            op,
            args,
            opgroup: self.opgroup(v).map(str::to_string),
        })
    }
}
