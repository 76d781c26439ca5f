//! The operation contract every base simulator exposes.

use crate::{ error::SimResult, stabilizer::QubitId };

/// Outcome of a single Z-basis measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Measurement {
    /// `true` for the -1 eigenvalue (∣1⟩).
    pub result: bool,
    /// `true` if the outcome was not determined by the state before the
    /// measurement.
    pub random: bool,
}

impl Measurement {
    pub fn deterministic(result: bool) -> Self { Self { result, random: false } }

    pub fn random(result: bool) -> Self { Self { result, random: true } }
}

/// A Clifford-state engine driven one primitive at a time.
///
/// Handles are only meaningful to the simulator that issued them; any method
/// given an unknown or freed handle returns
/// [`SimError::UnknownQubit`][crate::error::SimError::UnknownQubit].
pub trait Simulator {
    /// Allocate a fresh qubit in ∣0⟩.
    fn allocate(&mut self) -> SimResult<QubitId>;

    /// Release a qubit. Its state is discarded.
    fn free(&mut self, q: QubitId) -> SimResult<()>;

    /// Hadamard gate, exchanging the X and Z bases.
    fn hadamard(&mut self, q: QubitId) -> SimResult<()>;

    /// S gate: a quarter turn applied to the ∣1⟩ amplitude. Four applications
    /// are the identity.
    fn phase(&mut self, q: QubitId) -> SimResult<()>;

    /// Controlled NOT. Fails if `control == target`.
    fn cnot(&mut self, control: QubitId, target: QubitId) -> SimResult<()>;

    /// Projective Z-basis measurement.
    ///
    /// If the outcome is random, `bias` is the probability of reporting
    /// `true` (defaulting to ½); deterministic outcomes ignore it.
    fn measure(&mut self, q: QubitId, bias: Option<f64>) -> SimResult<Measurement>;

    /// Probability that a Z-basis measurement of `q` would give `true`,
    /// without disturbing the state.
    fn probability(&mut self, q: QubitId) -> SimResult<f64>;
}

impl<S: Simulator + ?Sized> Simulator for &mut S {
    fn allocate(&mut self) -> SimResult<QubitId> { (**self).allocate() }

    fn free(&mut self, q: QubitId) -> SimResult<()> { (**self).free(q) }

    fn hadamard(&mut self, q: QubitId) -> SimResult<()> { (**self).hadamard(q) }

    fn phase(&mut self, q: QubitId) -> SimResult<()> { (**self).phase(q) }

    fn cnot(&mut self, control: QubitId, target: QubitId) -> SimResult<()> {
        (**self).cnot(control, target)
    }

    fn measure(&mut self, q: QubitId, bias: Option<f64>)
        -> SimResult<Measurement>
    {
        (**self).measure(q, bias)
    }

    fn probability(&mut self, q: QubitId) -> SimResult<f64> {
        (**self).probability(q)
    }
}

pub(crate) fn check_bias(bias: Option<f64>) -> SimResult<Option<f64>> {
    match bias {
        Some(b) if !(0.0..=1.0).contains(&b) => {
            Err(crate::error::SimError::InvalidBias(b))
        },
        _ => Ok(bias),
    }
}
