//! Error types shared by the Pauli algebra, the base simulator and the caching
//! layer.

use thiserror::Error;
use crate::stabilizer::QubitId;

/// Malformed operator data, caught before anything touches a simulator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A character outside `{I, X, Y, Z}` (after the optional sign prefix).
    #[error("invalid Pauli character {ch:?} at position {pos}")]
    InvalidChar { ch: char, pos: usize },

    /// A qubit sequence paired with an operator of a different length.
    #[error("operator has {letters} letter(s) but {qubits} qubit(s) were given")]
    LengthMismatch { qubits: usize, letters: usize },

    /// The same handle appears twice in one operand.
    #[error("qubit {0} appears more than once")]
    DuplicateQubit(QubitId),
}

/// Anything that can go wrong while driving a simulator.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operand is well-formed but is not something that can be measured.
    #[error("don't know how to measure {operand}: {reason}")]
    UnsupportedOperand { operand: String, reason: &'static str },

    /// A collapse requested an outcome the state cannot produce.
    #[error("failed to post-select {operand} onto {outcome}: result impossible")]
    PostSelectionImpossible { operand: String, outcome: bool },

    /// The handle was never allocated, or has already been freed.
    #[error("unknown qubit {0}")]
    UnknownQubit(QubitId),

    /// A measurement bias outside of `[0, 1]`.
    #[error("bias {0} is not a valid probability")]
    InvalidBias(f64),
}

impl SimError {
    /// Return `true` if `self` came from malformed input rather than from the
    /// state of a simulator.
    pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(..)) }

    pub(crate) fn unsupported(operand: impl ToString, reason: &'static str)
        -> Self
    {
        Self::UnsupportedOperand { operand: operand.to_string(), reason }
    }
}

pub type SimResult<T> = Result<T, SimError>;
