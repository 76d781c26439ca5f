//! Commutation test between qubit-bound Pauli operators.
//!
//! Two Pauli operators anti-commute iff the number of qubits on which both act
//! non-trivially with *different* letters is odd. Qubits that only one of the
//! two operators touches never contribute.

use rustc_hash::FxHashMap;
use crate::{
    pauli::Pauli,
    stabilizer::{ QubitId, Stabilizer },
};

/// Return `true` if `a` and `b` anti-commute.
///
/// Symmetric in its arguments; phases are irrelevant.
pub fn anti_commutes(a: &Stabilizer, b: &Stabilizer) -> bool {
    mismatches(a, b) % 2 == 1
}

/// Return `true` if `a` and `b` commute.
pub fn commutes(a: &Stabilizer, b: &Stabilizer) -> bool { !anti_commutes(a, b) }

// number of shared qubits carrying two different non-identity letters
fn mismatches(a: &Stabilizer, b: &Stabilizer) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if small.len() <= 4 {
        return small.support()
            .filter(|(q, p)| {
                large.letter_at(*q)
                    .is_some_and(|r| !r.commutes_with(*p))
            })
            .count();
    }
    let letters: FxHashMap<QubitId, Pauli> = small.support().collect();
    large.support()
        .filter(|(q, p)| {
            letters.get(q)
                .is_some_and(|r| !r.commutes_with(*p))
        })
        .count()
}
