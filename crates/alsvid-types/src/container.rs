//! Pauli string containers: sparse (qubit-indexed) and dense (positional).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CastError;
use crate::pauli::Pauli;
use crate::unit::UnitId;

/// Behaviour required of a Pauli string container.
pub trait PauliContainer: Clone + PartialEq + fmt::Debug {
    /// Multiply two strings site-wise. Returns the aggregated phase in
    /// quarter turns together with the product string.
    fn multiply(a: &Self, b: &Self) -> (u8, Self);

    /// True iff the strings commute: the number of sites where both are
    /// non-identity and different is even.
    fn commutes(a: &Self, b: &Self) -> bool;

    /// Total order on strings, ignoring identity sites.
    fn compare(a: &Self, b: &Self) -> Ordering;

    /// Feed the non-identity content into a hasher; trailing identities
    /// are ignored so that equal strings hash equally.
    fn hash_paulis<H: Hasher>(&self, state: &mut H);

    /// Number of Y sites.
    fn n_ys(&self) -> usize;

    /// True iff every site is the identity.
    fn is_identity(&self) -> bool;
}

/// A sparse Pauli string: a map from qubits to non-identity Paulis.
///
/// Identity entries are permitted but semantically absent; [`compress`]
/// removes them.
///
/// [`compress`]: QubitPauliMap::compress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitPauliMap(pub BTreeMap<UnitId, Pauli>);

impl QubitPauliMap {
    /// An empty (identity) string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(qubit, pauli)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (UnitId, Pauli)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// The Pauli at a qubit; absent qubits read as identity.
    pub fn get(&self, qubit: &UnitId) -> Pauli {
        self.0.get(qubit).copied().unwrap_or(Pauli::I)
    }

    /// Set the Pauli at a qubit; setting identity removes the entry.
    pub fn set(&mut self, qubit: UnitId, pauli: Pauli) {
        if pauli == Pauli::I {
            self.0.remove(&qubit);
        } else {
            self.0.insert(qubit, pauli);
        }
    }

    /// Remove explicit identity entries.
    pub fn compress(&mut self) {
        self.0.retain(|_, p| *p != Pauli::I);
    }

    /// Qubits on which both strings act non-trivially.
    pub fn common_qubits(&self, other: &Self) -> BTreeSet<UnitId> {
        self.0
            .iter()
            .filter(|(q, p)| **p != Pauli::I && other.get(q) != Pauli::I)
            .map(|(q, _)| q.clone())
            .collect()
    }

    /// Qubits on which only `self` acts non-trivially.
    pub fn own_qubits(&self, other: &Self) -> BTreeSet<UnitId> {
        self.0
            .iter()
            .filter(|(q, p)| **p != Pauli::I && other.get(q) == Pauli::I)
            .map(|(q, _)| q.clone())
            .collect()
    }

    /// Qubits on which the strings act with different non-identity Paulis.
    pub fn conflicting_qubits(&self, other: &Self) -> BTreeSet<UnitId> {
        self.0
            .iter()
            .filter(|(q, p)| {
                let o = other.get(q);
                **p != Pauli::I && o != Pauli::I && o != **p
            })
            .map(|(q, _)| q.clone())
            .collect()
    }
}

impl PauliContainer for QubitPauliMap {
    fn multiply(a: &Self, b: &Self) -> (u8, Self) {
        let mut turns = 0u8;
        let mut result = BTreeMap::new();
        for (q, &pa) in &a.0 {
            let (t, p) = Pauli::multiply(pa, b.get(q));
            turns = (turns + t) % 4;
            if p != Pauli::I {
                result.insert(q.clone(), p);
            }
        }
        for (q, &pb) in &b.0 {
            if !a.0.contains_key(q) && pb != Pauli::I {
                result.insert(q.clone(), pb);
            }
        }
        (turns, Self(result))
    }

    fn commutes(a: &Self, b: &Self) -> bool {
        a.conflicting_qubits(b).len() % 2 == 0
    }

    /// Qubit ordering reflects Ignored Little-endian Ordering: the string
    /// whose leading (lowest) non-identity qubit comes first is the
    /// *greater* one, so `IZ < ZI` on the default register.
    fn compare(a: &Self, b: &Self) -> Ordering {
        let mut ai = a.0.iter().filter(|(_, p)| **p != Pauli::I);
        let mut bi = b.0.iter().filter(|(_, p)| **p != Pauli::I);
        loop {
            match (ai.next(), bi.next()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((qa, pa)), Some((qb, pb))) => {
                    // Reverse of leading qubit first, then Pauli letter.
                    match qa.cmp(qb) {
                        Ordering::Less => return Ordering::Greater,
                        Ordering::Greater => return Ordering::Less,
                        Ordering::Equal => match pa.cmp(pb) {
                            Ordering::Equal => {}
                            ord => return ord,
                        },
                    }
                }
            }
        }
    }

    fn hash_paulis<H: Hasher>(&self, state: &mut H) {
        for (q, p) in &self.0 {
            if *p != Pauli::I {
                q.hash(state);
                p.hash(state);
            }
        }
    }

    fn n_ys(&self) -> usize {
        self.0.values().filter(|p| **p == Pauli::Y).count()
    }

    fn is_identity(&self) -> bool {
        self.0.values().all(|p| *p == Pauli::I)
    }
}

/// A dense Pauli string: a vector indexed by default-register qubit.
///
/// Strings of different lengths are comparable; trailing identities are
/// insignificant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensePauliMap(pub Vec<Pauli>);

impl DensePauliMap {
    /// Build from a list of Paulis.
    pub fn from_paulis(paulis: impl IntoIterator<Item = Pauli>) -> Self {
        Self(paulis.into_iter().collect())
    }

    /// The Pauli at a position; positions past the end read as identity.
    pub fn get(&self, index: usize) -> Pauli {
        self.0.get(index).copied().unwrap_or(Pauli::I)
    }

    /// Set the Pauli at a position, growing the string if needed.
    pub fn set(&mut self, index: usize, pauli: Pauli) {
        if index >= self.0.len() {
            if pauli == Pauli::I {
                return;
            }
            self.0.resize(index + 1, Pauli::I);
        }
        self.0[index] = pauli;
    }

    /// Positions where the strings act with different non-identity Paulis.
    pub fn conflicting_indices(&self, other: &Self) -> BTreeSet<usize> {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .filter(|&i| {
                let a = self.get(i);
                let b = other.get(i);
                a != Pauli::I && b != Pauli::I && a != b
            })
            .collect()
    }
}

impl PauliContainer for DensePauliMap {
    fn multiply(a: &Self, b: &Self) -> (u8, Self) {
        let len = a.0.len().max(b.0.len());
        let mut turns = 0u8;
        let mut result = Vec::with_capacity(len);
        for i in 0..len {
            let (t, p) = Pauli::multiply(a.get(i), b.get(i));
            turns = (turns + t) % 4;
            result.push(p);
        }
        (turns, Self(result))
    }

    fn commutes(a: &Self, b: &Self) -> bool {
        a.conflicting_indices(b).len() % 2 == 0
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        let len = a.0.len().min(b.0.len());
        for i in 0..len {
            match a.0[i].cmp(&b.0[i]) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        if a.0[len..].iter().any(|p| *p != Pauli::I) {
            Ordering::Greater
        } else if b.0[len..].iter().any(|p| *p != Pauli::I) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    fn hash_paulis<H: Hasher>(&self, state: &mut H) {
        let trailing = self.0.iter().rev().take_while(|p| **p == Pauli::I).count();
        for p in &self.0[..self.0.len() - trailing] {
            p.hash(state);
        }
    }

    fn n_ys(&self) -> usize {
        self.0.iter().filter(|p| **p == Pauli::Y).count()
    }

    fn is_identity(&self) -> bool {
        self.0.iter().all(|p| *p == Pauli::I)
    }
}

/// Fallible cast from one container shape into another.
pub trait ContainerCast<Dst: PauliContainer>: PauliContainer {
    /// Perform the cast.
    fn cast_container(&self) -> Result<Dst, CastError>;
}

impl ContainerCast<QubitPauliMap> for QubitPauliMap {
    fn cast_container(&self) -> Result<QubitPauliMap, CastError> {
        Ok(self.clone())
    }
}

impl ContainerCast<QubitPauliMap> for DensePauliMap {
    fn cast_container(&self) -> Result<QubitPauliMap, CastError> {
        Ok(QubitPauliMap(
            self.0
                .iter()
                .enumerate()
                .filter(|(_, p)| **p != Pauli::I)
                .map(|(i, p)| (UnitId::default_qubit(i as u32), *p))
                .collect(),
        ))
    }
}

impl ContainerCast<DensePauliMap> for QubitPauliMap {
    /// Requires every qubit to be a single-indexed default-register qubit.
    /// The dense length is `max_index + 1`.
    fn cast_container(&self) -> Result<DensePauliMap, CastError> {
        let mut max_index = 0usize;
        for (q, p) in &self.0 {
            if *p == Pauli::I {
                continue;
            }
            if !q.is_default_qubit() {
                return Err(CastError::NonDefaultRegister {
                    unit: q.to_string(),
                });
            }
            max_index = max_index.max(q.index()[0] as usize);
        }
        if self.0.values().all(|p| *p == Pauli::I) {
            return Ok(DensePauliMap::default());
        }
        let mut dense = vec![Pauli::I; max_index + 1];
        for (q, p) in &self.0 {
            if *p != Pauli::I {
                dense[q.index()[0] as usize] = *p;
            }
        }
        Ok(DensePauliMap(dense))
    }
}

impl ContainerCast<DensePauliMap> for DensePauliMap {
    fn cast_container(&self) -> Result<DensePauliMap, CastError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(paulis: &[Pauli]) -> QubitPauliMap {
        QubitPauliMap::from_pairs(
            paulis
                .iter()
                .enumerate()
                .map(|(i, p)| (UnitId::default_qubit(i as u32), *p)),
        )
    }

    #[test]
    fn test_sparse_multiply() {
        use Pauli::{X, Y, Z};
        let a = sparse(&[X]);
        let b = sparse(&[Y]);
        let (turns, prod) = QubitPauliMap::multiply(&a, &b);
        assert_eq!(turns, 1);
        assert_eq!(prod, sparse(&[Z]));

        let (turns, prod) = QubitPauliMap::multiply(&b, &a);
        assert_eq!(turns, 3);
        assert_eq!(prod, sparse(&[Z]));
    }

    #[test]
    fn test_commutation_parity() {
        use Pauli::{I, X, Y, Z};
        let a = sparse(&[X, Y, Z, Y, X]);
        let b = sparse(&[Z, X, Y, Z, I]);
        // Four conflicting sites: even, so they commute.
        assert!(QubitPauliMap::commutes(&a, &b));
        let c = sparse(&[Z, X, Y, Z, Z]);
        assert!(!QubitPauliMap::commutes(&a, &c));
    }

    #[test]
    fn test_ilo_ordering() {
        use Pauli::{I, Z};
        // IZ < ZI: Z on the higher-indexed qubit is the smaller string.
        let iz = sparse(&[I, Z]);
        let zi = sparse(&[Z, I]);
        assert_eq!(QubitPauliMap::compare(&iz, &zi), Ordering::Less);
        assert_eq!(QubitPauliMap::compare(&zi, &iz), Ordering::Greater);
    }

    #[test]
    fn test_identity_sites_ignored() {
        use Pauli::{I, X};
        let a = sparse(&[X, I]);
        let b = sparse(&[X]);
        assert_eq!(QubitPauliMap::compare(&a, &b), Ordering::Equal);

        let dense_a = DensePauliMap::from_paulis([X, I, I]);
        let dense_b = DensePauliMap::from_paulis([X]);
        assert_eq!(DensePauliMap::compare(&dense_a, &dense_b), Ordering::Equal);
    }

    #[test]
    fn test_dense_to_sparse_and_back() {
        use Pauli::{I, X, Z};
        let dense = DensePauliMap::from_paulis([Z, I, X]);
        let sparse: QubitPauliMap = dense.cast_container().unwrap();
        assert_eq!(sparse.0.len(), 2);
        let back: DensePauliMap = sparse.cast_container().unwrap();
        assert_eq!(back, dense);
    }

    #[test]
    fn test_sparse_to_dense_rejects_named_register() {
        let mut map = QubitPauliMap::new();
        map.set(UnitId::qubit("anc", 0), Pauli::X);
        let res: Result<DensePauliMap, _> = map.cast_container();
        assert!(matches!(res, Err(CastError::NonDefaultRegister { .. })));
    }
}
