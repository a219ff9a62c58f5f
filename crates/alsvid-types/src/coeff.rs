//! Coefficient domains for Pauli tensors.
//!
//! Four domains are supported: no coefficient (`()`), integer powers of i
//! ([`QuarterTurns`]), floating-point complex ([`Complex64`]) and symbolic
//! ([`Expr`]). Lossless casts between them always succeed; lossy casts
//! fail with [`CastError`] when the value is not representable.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CastError;
use crate::expr::Expr;

/// Tolerance used when recognising exact powers of i.
const EPS: f64 = 1e-11;

/// A coefficient that is an integer power of the imaginary unit, stored
/// canonically mod 4: `i^0 = 1`, `i^1 = i`, `i^2 = -1`, `i^3 = -i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterTurns(u8);

impl QuarterTurns {
    /// Create from a turn count; reduced mod 4.
    pub fn new(turns: u8) -> Self {
        Self(turns % 4)
    }

    /// The canonical turn count, in `0..4`.
    #[inline]
    pub fn turns(self) -> u8 {
        self.0
    }

    /// The coefficient as a complex number.
    pub fn to_complex(self) -> Complex64 {
        match self.0 {
            0 => Complex64::new(1.0, 0.0),
            1 => Complex64::new(0.0, 1.0),
            2 => Complex64::new(-1.0, 0.0),
            _ => Complex64::new(0.0, -1.0),
        }
    }
}

impl fmt::Display for QuarterTurns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => Ok(()),
            1 => write!(f, "i*"),
            2 => write!(f, "-"),
            _ => write!(f, "-i*"),
        }
    }
}

/// Behaviour required of a Pauli tensor coefficient domain.
pub trait Coeff: Clone + PartialEq + fmt::Debug {
    /// The multiplicative identity of the domain.
    fn identity() -> Self;

    /// Multiply two coefficients.
    fn multiply(&self, other: &Self) -> Self;

    /// Embed a power of i into the domain.
    fn from_quarter_turns(turns: QuarterTurns) -> Self;

    /// Total order on coefficients, in canonical form.
    fn compare(&self, other: &Self) -> Ordering;

    /// Feed the canonical form of the coefficient into a hasher.
    fn hash_coeff<H: Hasher>(&self, state: &mut H);
}

impl Coeff for () {
    fn identity() -> Self {}

    fn multiply(&self, _other: &Self) -> Self {}

    fn from_quarter_turns(_turns: QuarterTurns) -> Self {}

    fn compare(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }

    fn hash_coeff<H: Hasher>(&self, _state: &mut H) {}
}

impl Coeff for QuarterTurns {
    fn identity() -> Self {
        QuarterTurns(0)
    }

    fn multiply(&self, other: &Self) -> Self {
        QuarterTurns((self.0 + other.0) % 4)
    }

    fn from_quarter_turns(turns: QuarterTurns) -> Self {
        turns
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    fn hash_coeff<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Coeff for Complex64 {
    fn identity() -> Self {
        Complex64::new(1.0, 0.0)
    }

    fn multiply(&self, other: &Self) -> Self {
        self * other
    }

    fn from_quarter_turns(turns: QuarterTurns) -> Self {
        turns.to_complex()
    }

    /// Ordered on `re` before `im`. This is a total order but not the
    /// lexicographic `(norm, arg)` order some callers may expect.
    fn compare(&self, other: &Self) -> Ordering {
        match self.re.partial_cmp(&other.re) {
            Some(Ordering::Equal) | None => {
                self.im.partial_cmp(&other.im).unwrap_or(Ordering::Equal)
            }
            Some(ord) => ord,
        }
    }

    fn hash_coeff<H: Hasher>(&self, state: &mut H) {
        self.re.to_bits().hash(state);
        self.im.to_bits().hash(state);
    }
}

impl Coeff for Expr {
    fn identity() -> Self {
        Expr::one()
    }

    fn multiply(&self, other: &Self) -> Self {
        (self.clone() * other.clone()).simplify()
    }

    fn from_quarter_turns(turns: QuarterTurns) -> Self {
        match turns.turns() {
            0 => Expr::one(),
            1 => Expr::I,
            2 => Expr::constant(-1.0),
            _ => -Expr::I,
        }
    }

    /// Numeric expressions compare by value (`re` before `im`); symbolic
    /// expressions fall back to their canonical rendering, which gives a
    /// deterministic total order.
    fn compare(&self, other: &Self) -> Ordering {
        match (self.eval_complex(), other.eval_complex()) {
            (Some(a), Some(b)) => Coeff::compare(&a, &b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }

    fn hash_coeff<H: Hasher>(&self, state: &mut H) {
        self.hash(state);
    }
}

/// Fallible cast from one coefficient domain into another.
///
/// Losing information (dropping the coefficient entirely) is permitted;
/// casts that would have to invent a value that is not representable
/// fail instead.
pub trait CoeffCast<Dst: Coeff>: Coeff {
    /// Perform the cast.
    fn cast_coeff(&self) -> Result<Dst, CastError>;
}

impl CoeffCast<()> for () {
    fn cast_coeff(&self) -> Result<(), CastError> {
        Ok(())
    }
}
impl CoeffCast<QuarterTurns> for () {
    fn cast_coeff(&self) -> Result<QuarterTurns, CastError> {
        Ok(QuarterTurns::new(0))
    }
}
impl CoeffCast<Complex64> for () {
    fn cast_coeff(&self) -> Result<Complex64, CastError> {
        Ok(Complex64::new(1.0, 0.0))
    }
}
impl CoeffCast<Expr> for () {
    fn cast_coeff(&self) -> Result<Expr, CastError> {
        Ok(Expr::one())
    }
}

impl CoeffCast<()> for QuarterTurns {
    fn cast_coeff(&self) -> Result<(), CastError> {
        Ok(())
    }
}
impl CoeffCast<QuarterTurns> for QuarterTurns {
    fn cast_coeff(&self) -> Result<QuarterTurns, CastError> {
        Ok(*self)
    }
}
impl CoeffCast<Complex64> for QuarterTurns {
    fn cast_coeff(&self) -> Result<Complex64, CastError> {
        Ok(self.to_complex())
    }
}
impl CoeffCast<Expr> for QuarterTurns {
    fn cast_coeff(&self) -> Result<Expr, CastError> {
        Ok(Expr::from_quarter_turns(*self))
    }
}

impl CoeffCast<()> for Complex64 {
    fn cast_coeff(&self) -> Result<(), CastError> {
        Ok(())
    }
}
impl CoeffCast<QuarterTurns> for Complex64 {
    fn cast_coeff(&self) -> Result<QuarterTurns, CastError> {
        for t in 0..4u8 {
            if (self - QuarterTurns::new(t).to_complex()).norm() < EPS {
                return Ok(QuarterTurns::new(t));
            }
        }
        Err(CastError::NonPowerOfI)
    }
}
impl CoeffCast<Complex64> for Complex64 {
    fn cast_coeff(&self) -> Result<Complex64, CastError> {
        Ok(*self)
    }
}
impl CoeffCast<Expr> for Complex64 {
    fn cast_coeff(&self) -> Result<Expr, CastError> {
        if self.im == 0.0 {
            Ok(Expr::constant(self.re))
        } else {
            Ok((Expr::constant(self.re) + Expr::constant(self.im) * Expr::I).simplify())
        }
    }
}

impl CoeffCast<()> for Expr {
    fn cast_coeff(&self) -> Result<(), CastError> {
        Ok(())
    }
}
impl CoeffCast<QuarterTurns> for Expr {
    fn cast_coeff(&self) -> Result<QuarterTurns, CastError> {
        let v = self.eval_complex().ok_or(CastError::UnevaluatedSymbol)?;
        CoeffCast::<QuarterTurns>::cast_coeff(&v)
    }
}
impl CoeffCast<Complex64> for Expr {
    fn cast_coeff(&self) -> Result<Complex64, CastError> {
        self.eval_complex().ok_or(CastError::UnevaluatedSymbol)
    }
}
impl CoeffCast<Expr> for Expr {
    fn cast_coeff(&self) -> Result<Expr, CastError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turn_arithmetic() {
        let a = QuarterTurns::new(3);
        let b = QuarterTurns::new(2);
        assert_eq!(a.multiply(&b), QuarterTurns::new(1));
        assert_eq!(QuarterTurns::new(6), QuarterTurns::new(2));
    }

    #[test]
    fn test_complex_to_quarter_turns() {
        let i = Complex64::new(0.0, 1.0);
        assert_eq!(
            CoeffCast::<QuarterTurns>::cast_coeff(&i).unwrap(),
            QuarterTurns::new(1)
        );
        let bad = Complex64::new(0.5, 0.5);
        assert_eq!(
            CoeffCast::<QuarterTurns>::cast_coeff(&bad),
            Err(CastError::NonPowerOfI)
        );
    }

    #[test]
    fn test_symbolic_to_complex() {
        let e = Expr::constant(2.0) * Expr::I;
        assert_eq!(
            CoeffCast::<Complex64>::cast_coeff(&e).unwrap(),
            Complex64::new(0.0, 2.0)
        );
        let sym = Expr::symbol("a");
        assert_eq!(
            CoeffCast::<Complex64>::cast_coeff(&sym),
            Err(CastError::UnevaluatedSymbol)
        );
    }

    #[test]
    fn test_unit_casts_anywhere() {
        assert_eq!(
            CoeffCast::<Complex64>::cast_coeff(&()).unwrap(),
            Complex64::new(1.0, 0.0)
        );
        assert_eq!(CoeffCast::<Expr>::cast_coeff(&()).unwrap(), Expr::one());
    }

    #[test]
    fn test_complex_order_real_first() {
        let a = Complex64::new(0.0, 5.0);
        let b = Complex64::new(1.0, -5.0);
        assert_eq!(Coeff::compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_round_trip_through_wider_domain() {
        let t = QuarterTurns::new(3);
        let c: Complex64 = t.cast_coeff().unwrap();
        let back: QuarterTurns = c.cast_coeff().unwrap();
        assert_eq!(t, back);
    }
}
