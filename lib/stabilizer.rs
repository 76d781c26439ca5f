//! Pauli operators bound to specific qubits.

use std::fmt;
use itertools::Itertools;
use crate::{
    commute,
    error::ValidationError,
    pauli::{ Pauli, PauliWord },
};

/// Opaque handle to a qubit owned by a simulator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QubitId(usize);

impl QubitId {
    pub fn new(index: usize) -> Self { Self(index) }

    pub fn index(self) -> usize { self.0 }
}

impl From<usize> for QubitId {
    fn from(index: usize) -> Self { Self(index) }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// A [`PauliWord`] placed on an ordered list of distinct qubits; the `k`-th
/// letter acts on the `k`-th qubit.
///
/// Equality is structural: the same qubits *in the same order* with the same
/// word, including its phase. Use [`Self::canonical`] to get an
/// order-independent representative.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Stabilizer {
    qubits: Vec<QubitId>,
    word: PauliWord,
}

impl Stabilizer {
    /// Pair a qubit sequence with a word of the same length.
    ///
    /// Fails if the lengths differ or if any qubit appears more than once.
    pub fn new<I>(qubits: I, word: PauliWord) -> Result<Self, ValidationError>
    where I: IntoIterator<Item = QubitId>
    {
        let qubits: Vec<QubitId> = qubits.into_iter().collect();
        if qubits.len() != word.len() {
            return Err(ValidationError::LengthMismatch {
                qubits: qubits.len(),
                letters: word.len(),
            });
        }
        if let Some(q) = qubits.iter().duplicates().next() {
            return Err(ValidationError::DuplicateQubit(*q));
        }
        Ok(Self { qubits, word })
    }

    /// Like [`Self::new`], but parsing the word from text.
    pub fn parse<I>(qubits: I, word: &str) -> Result<Self, ValidationError>
    where I: IntoIterator<Item = QubitId>
    {
        Self::new(qubits, word.parse()?)
    }

    /// A single-qubit operator.
    pub fn single(qubit: QubitId, op: Pauli) -> Self {
        Self { qubits: vec![qubit], word: PauliWord::single(op) }
    }

    pub fn qubits(&self) -> &[QubitId] { &self.qubits }

    pub fn word(&self) -> &PauliWord { &self.word }

    pub fn len(&self) -> usize { self.qubits.len() }

    pub fn is_empty(&self) -> bool { self.qubits.is_empty() }

    /// The first qubit in the sequence, under which cache lookups happen.
    pub fn lead(&self) -> Option<QubitId> { self.qubits.first().copied() }

    /// Return `true` if `qubit` is part of the sequence (identity letters
    /// included).
    pub fn touches(&self, qubit: QubitId) -> bool { self.qubits.contains(&qubit) }

    /// Iterate over (qubit, letter) pairs in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, Pauli)> + '_ {
        self.qubits.iter().copied().zip(self.word.letters().iter().copied())
    }

    /// Iterate over (qubit, letter) pairs, skipping identities.
    pub fn support(&self) -> impl Iterator<Item = (QubitId, Pauli)> + '_ {
        self.iter().filter(|(_, p)| !p.is_identity())
    }

    /// Letter acting on `qubit`, if `qubit` is in the sequence.
    pub fn letter_at(&self, qubit: QubitId) -> Option<Pauli> {
        self.qubits.iter()
            .position(|q| *q == qubit)
            .and_then(|k| self.word.get(k))
    }

    /// Return `true` if `self` and `other` anti-commute.
    ///
    /// See [`commute::anti_commutes`].
    pub fn anti_commutes(&self, other: &Self) -> bool {
        commute::anti_commutes(self, other)
    }

    /// The same operator with its qubits sorted in ascending order.
    pub fn canonical(&self) -> Self {
        let order: Vec<usize>
            = (0..self.qubits.len())
            .sorted_by_key(|k| self.qubits[*k])
            .collect();
        Self {
            qubits: order.iter().map(|&k| self.qubits[k]).collect(),
            word: self.word.permuted(&order),
        }
    }

    /// Algebraic product `self · other` over the union of both supports.
    ///
    /// The result lists `self`'s qubits first, followed by any of `other`'s
    /// qubits not already present, in `other`'s order.
    pub fn times(&self, other: &Self) -> Self {
        let qubits: Vec<QubitId>
            = self.qubits.iter()
            .chain(other.qubits.iter())
            .copied()
            .unique()
            .collect();
        let lift = |s: &Self| -> PauliWord {
            PauliWord::new(
                s.word.phase(),
                qubits.iter().map(|q| s.letter_at(*q).unwrap_or(Pauli::I)),
            )
        };
        let word = lift(self).times(&lift(other));
        Self { qubits, word }
    }
}

impl fmt::Display for Stabilizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.word, self.qubits.iter().join(","))
    }
}

/// Anything that can be measured: a bare qubit (in the Z basis) or a
/// multi-qubit operator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Single(QubitId),
    Multi(Stabilizer),
}

impl Operand {
    /// Resolve to a stabilizer; a bare qubit becomes `Z` on that qubit.
    pub fn into_stabilizer(self) -> Stabilizer {
        match self {
            Self::Single(q) => Stabilizer::single(q, Pauli::Z),
            Self::Multi(s) => s,
        }
    }
}

impl From<QubitId> for Operand {
    fn from(q: QubitId) -> Self { Self::Single(q) }
}

impl From<Stabilizer> for Operand {
    fn from(s: Stabilizer) -> Self { Self::Multi(s) }
}

impl From<&Stabilizer> for Operand {
    fn from(s: &Stabilizer) -> Self { Self::Multi(s.clone()) }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(q) => fmt::Display::fmt(q, f),
            Self::Multi(s) => fmt::Display::fmt(s, f),
        }
    }
}
