//! Fixed replacement templates used by the optimisation passes.

use crate::circuit::Circuit;
use crate::error::IrResult;

/// `CX; X(control)` rewritten with the Pauli copied backwards:
/// `X(0); X(1); CX(0, 1)`.
pub fn x1_cx() -> IrResult<Circuit> {
    let mut circ = Circuit::with_size(2, 0);
    circ.x(0)?.x(1)?.cx(0, 1)?;
    Ok(circ)
}

/// `CX; Z(target)` rewritten with the Pauli copied backwards:
/// `Z(0); Z(1); CX(0, 1)`.
pub fn z0_cx() -> IrResult<Circuit> {
    let mut circ = Circuit::with_size(2, 0);
    circ.z(0)?.z(1)?.cx(0, 1)?;
    Ok(circ)
}

/// A SWAP expressed as three CX gates.
pub fn swap_using_cx() -> IrResult<Circuit> {
    let mut circ = Circuit::with_size(2, 0);
    circ.cx(0, 1)?.cx(1, 0)?.cx(0, 1)?;
    Ok(circ)
}

/// `CX(0,1); CX(1,0)` collapsed to a SWAP followed by one CX; the SWAP
/// is cheap when it can be elided into the implicit permutation.
pub fn swap_cx() -> IrResult<Circuit> {
    let mut circ = Circuit::with_size(2, 0);
    circ.swap(0, 1)?.cx(0, 1)?;
    Ok(circ)
}

/// A CX with the control and target exchanged, conjugated by Hadamards.
pub fn cx_flipped() -> IrResult<Circuit> {
    let mut circ = Circuit::with_size(2, 0);
    circ.h(0)?.h(1)?.cx(1, 0)?.h(0)?.h(1)?;
    Ok(circ)
}
