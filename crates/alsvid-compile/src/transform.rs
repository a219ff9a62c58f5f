//! Composable circuit transforms.
//!
//! A [`Transform`] maps a circuit to a changed-flag. Transforms compose
//! by sequencing and fixed-point repetition; each application leaves the
//! circuit well-formed even when it reports no change.

use tracing::debug;

use alsvid_ir::Circuit;

use crate::error::{CompileError, CompileResult};

/// A named circuit-to-circuit rewrite returning whether it changed
/// anything.
pub struct Transform {
    name: String,
    func: Box<dyn Fn(&mut Circuit) -> CompileResult<bool>>,
}

impl Transform {
    /// Wrap a rewrite function.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut Circuit) -> CompileResult<bool> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// The transform's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply to a circuit. Returns true iff the circuit changed.
    pub fn apply(&self, circ: &mut Circuit) -> CompileResult<bool> {
        let changed = (self.func)(circ)?;
        debug!(transform = %self.name, changed, "transform applied");
        Ok(changed)
    }

    /// Run `self`, then `next`; changed iff either changed.
    pub fn then(self, next: Transform) -> Transform {
        let name = format!("{} >> {}", self.name, next.name);
        Transform::new(name, move |circ| {
            let a = self.apply(circ)?;
            let b = next.apply(circ)?;
            Ok(a || b)
        })
    }

    /// Run a list of transforms in order.
    pub fn sequence(transforms: Vec<Transform>) -> Transform {
        let name = transforms
            .iter()
            .map(Transform::name)
            .collect::<Vec<_>>()
            .join(" >> ");
        Transform::new(name, move |circ| {
            let mut changed = false;
            for t in &transforms {
                changed |= t.apply(circ)?;
            }
            Ok(changed)
        })
    }

    /// Repeat until a fixed point: apply until no change is reported.
    /// Changed iff the first application changed anything.
    pub fn repeat(self) -> Transform {
        let name = format!("repeat({})", self.name);
        Transform::new(name, move |circ| {
            let mut changed = false;
            while self.apply(circ)? {
                changed = true;
            }
            Ok(changed)
        })
    }

    /// Repeat until `pred` holds on the circuit. Fails with
    /// [`CompileError::PredicateNotSatisfied`] if the transform
    /// stabilises first.
    pub fn repeat_until(
        self,
        pred: impl Fn(&Circuit) -> bool + 'static,
    ) -> Transform {
        let name = format!("repeat_until({})", self.name);
        Transform::new(name, move |circ| {
            let mut changed = false;
            loop {
                if pred(circ) {
                    return Ok(changed);
                }
                if !self.apply(circ)? {
                    return Err(CompileError::PredicateNotSatisfied);
                }
                changed = true;
            }
        })
    }

    /// The identity transform.
    pub fn id() -> Transform {
        Transform::new("id", |_| Ok(false))
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::{GraphRewiring, OpType, VertexDeletion};

    /// Removes one H gate per application.
    fn pop_h() -> Transform {
        Transform::new("pop_h", |circ| {
            let h = circ
                .op_vertices()
                .into_iter()
                .find(|&v| circ.optype(v) == OpType::H);
            match h {
                Some(v) => {
                    circ.remove_vertex(v, GraphRewiring::Yes, VertexDeletion::Yes)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    #[test]
    fn test_sequence_reports_any_change() {
        let mut circ = Circuit::with_size(1, 0);
        circ.h(0).unwrap();
        let t = Transform::id().then(pop_h());
        assert!(t.apply(&mut circ).unwrap());
        assert!(!pop_h().apply(&mut circ).unwrap());
    }

    #[test]
    fn test_repeat_reaches_fixed_point() {
        let mut circ = Circuit::with_size(1, 0);
        circ.h(0).unwrap().h(0).unwrap().h(0).unwrap();
        assert!(pop_h().repeat().apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::H, false), 0);
    }

    #[test]
    fn test_repeat_until_satisfied() {
        let mut circ = Circuit::with_size(1, 0);
        circ.h(0).unwrap().h(0).unwrap();
        let t = pop_h().repeat_until(|c| c.count_gates(OpType::H, false) <= 1);
        assert!(t.apply(&mut circ).unwrap());
        assert_eq!(circ.count_gates(OpType::H, false), 1);
    }

    #[test]
    fn test_repeat_until_unsatisfiable() {
        let mut circ = Circuit::with_size(1, 0);
        circ.x(0).unwrap();
        let t = pop_h().repeat_until(|c| c.count_gates(OpType::X, false) == 0);
        assert!(matches!(
            t.apply(&mut circ),
            Err(CompileError::PredicateNotSatisfied)
        ));
    }
}
