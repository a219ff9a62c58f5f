//! Pauli tensors: a Pauli string together with a scalar coefficient.

use num_complex::Complex64;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hasher;

use crate::coeff::{Coeff, CoeffCast, QuarterTurns};
use crate::container::{ContainerCast, DensePauliMap, PauliContainer, QubitPauliMap};
use crate::error::CastError;
use crate::expr::Expr;
use crate::pauli::Pauli;
use crate::unit::UnitId;

/// An element of the Pauli group: a string container `C` with a
/// coefficient from domain `T`.
///
/// Equality, ordering and hashing all work on the canonical form:
/// identity sites are ignored and quarter-turn coefficients are reduced
/// mod 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauliTensor<C: PauliContainer, T: Coeff> {
    /// The Pauli string.
    pub string: C,
    /// The scalar coefficient.
    pub coeff: T,
}

impl<C: PauliContainer, T: Coeff> PauliTensor<C, T> {
    /// Build from a string and coefficient.
    pub fn new(string: C, coeff: T) -> Self {
        Self { string, coeff }
    }

    /// The identity tensor with unit coefficient.
    pub fn identity() -> Self
    where
        C: Default,
    {
        Self {
            string: C::default(),
            coeff: T::identity(),
        }
    }

    /// Compare coefficients first, then strings under ILO.
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.coeff.compare(&other.coeff) {
            Ordering::Equal => C::compare(&self.string, &other.string),
            ord => ord,
        }
    }

    /// True iff the strings commute; coefficients are irrelevant.
    pub fn commutes_with<U: Coeff>(&self, other: &PauliTensor<C, U>) -> bool {
        C::commutes(&self.string, &other.string)
    }

    /// Multiply, aggregating the anticommutation phase into the
    /// coefficient.
    pub fn multiply(&self, other: &Self) -> Self {
        let (turns, string) = C::multiply(&self.string, &other.string);
        let coeff = self
            .coeff
            .multiply(&other.coeff)
            .multiply(&T::from_quarter_turns(QuarterTurns::new(turns)));
        Self { string, coeff }
    }

    /// Transpose: multiplies the coefficient by (−1)^(#Y).
    pub fn transpose(&mut self) {
        if self.string.n_ys() % 2 == 1 {
            self.coeff = self
                .coeff
                .multiply(&T::from_quarter_turns(QuarterTurns::new(2)));
        }
    }

    /// A stable hash of the canonical form, consistent with equality.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.string.hash_paulis(&mut hasher);
        self.coeff.hash_coeff(&mut hasher);
        hasher.finish()
    }

    /// Cast into another container shape and coefficient domain.
    pub fn cast<C2, T2>(&self) -> Result<PauliTensor<C2, T2>, CastError>
    where
        C2: PauliContainer,
        T2: Coeff,
        C: ContainerCast<C2>,
        T: CoeffCast<T2>,
    {
        Ok(PauliTensor {
            string: self.string.cast_container()?,
            coeff: self.coeff.cast_coeff()?,
        })
    }
}

impl<C: PauliContainer, T: Coeff> PartialEq for PauliTensor<C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl<C: PauliContainer, T: Coeff> Eq for PauliTensor<C, T> {}

impl<C: PauliContainer, T: Coeff> PartialOrd for PauliTensor<C, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<C: PauliContainer, T: Coeff> Ord for PauliTensor<C, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<C: PauliContainer, T: Coeff> std::ops::Mul for &PauliTensor<C, T> {
    type Output = PauliTensor<C, T>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(rhs)
    }
}

impl<T: Coeff> PauliTensor<QubitPauliMap, T> {
    /// The Pauli at a qubit; absent qubits read as identity.
    pub fn get(&self, qubit: &UnitId) -> Pauli {
        self.string.get(qubit)
    }

    /// Set the Pauli at a qubit.
    pub fn set(&mut self, qubit: UnitId, pauli: Pauli) {
        self.string.set(qubit, pauli);
    }

    /// Remove explicit identity entries from the string.
    pub fn compress(&mut self) {
        self.string.compress();
    }

    /// Build from `(qubit, pauli)` pairs with unit coefficient.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (UnitId, Pauli)>) -> Self {
        Self::new(QubitPauliMap::from_pairs(pairs), T::identity())
    }
}

impl<T: Coeff> PauliTensor<DensePauliMap, T> {
    /// The Pauli at a position.
    pub fn get(&self, index: usize) -> Pauli {
        self.string.get(index)
    }

    /// Set the Pauli at a position, growing the string if needed.
    pub fn set(&mut self, index: usize, pauli: Pauli) {
        self.string.set(index, pauli);
    }

    /// Build from a list of Paulis with unit coefficient.
    pub fn from_paulis(paulis: impl IntoIterator<Item = Pauli>) -> Self {
        Self::new(DensePauliMap::from_paulis(paulis), T::identity())
    }
}

impl<T: Coeff + fmt::Display> fmt::Display for PauliTensor<QubitPauliMap, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.coeff)?;
        let mut first = true;
        for (q, p) in &self.string.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{p}{q}")?;
            first = false;
        }
        write!(f, ")")
    }
}

impl<T: Coeff + fmt::Display> fmt::Display for PauliTensor<DensePauliMap, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coeff)?;
        for p in &self.string.0 {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// Sparse string, no coefficient.
pub type SpPauliString = PauliTensor<QubitPauliMap, ()>;
/// Dense string, no coefficient.
pub type PauliString = PauliTensor<DensePauliMap, ()>;
/// Sparse string, power-of-i coefficient.
pub type SpPauliStabiliser = PauliTensor<QubitPauliMap, QuarterTurns>;
/// Dense string, power-of-i coefficient.
pub type PauliStabiliser = PauliTensor<DensePauliMap, QuarterTurns>;
/// Sparse string, complex coefficient.
pub type SpCxPauliTensor = PauliTensor<QubitPauliMap, Complex64>;
/// Dense string, complex coefficient.
pub type CxPauliTensor = PauliTensor<DensePauliMap, Complex64>;
/// Sparse string, symbolic coefficient.
pub type SpSymPauliTensor = PauliTensor<QubitPauliMap, Expr>;
/// Dense string, symbolic coefficient.
pub type SymPauliTensor = PauliTensor<DensePauliMap, Expr>;
