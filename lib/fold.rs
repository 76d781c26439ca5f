//! Reduction of a multi-qubit Pauli measurement to a single-qubit Z
//! measurement.
//!
//! Folding in rotates every non-identity letter of a [`Stabilizer`] onto the Z
//! basis (X by H, Y by H·S·H) and then chains the parity of all those qubits
//! onto a single *pivot* qubit with CNOTs. The pivot's Z eigenvalue is then the
//! eigenvalue of the unfolded operator. Folding out undoes the CNOT chain and
//! then the basis changes, leaving every qubit but the measured parity exactly
//! where it was.
//!
//! The pivot is either the first non-identity qubit of the operator
//! ([`Pivot::Lead`]) or a temporary qubit allocated for the purpose
//! ([`Pivot::Ancilla`]).

use log::trace;
use crate::{
    error::{ SimError, SimResult },
    pauli::Pauli,
    sim::{ self, Measurement, Simulator },
    stabilizer::{ QubitId, Stabilizer },
};

/// Where the parity of a folded operator is collected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Pivot {
    /// The first qubit carrying a non-identity letter.
    #[default]
    Lead,
    /// A fresh qubit, released again once it has been read.
    Ancilla,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Step {
    H(QubitId),
    S(QubitId),
    Cnot(QubitId, QubitId),
}

impl Step {
    fn apply<S>(self, sim: &mut S) -> SimResult<()>
    where S: Simulator + ?Sized
    {
        match self {
            Self::H(q) => sim.hadamard(q),
            Self::S(q) => sim.phase(q),
            Self::Cnot(c, t) => sim.cnot(c, t),
        }
    }

    fn undo<S>(self, sim: &mut S) -> SimResult<()>
    where S: Simulator + ?Sized
    {
        match self {
            Self::S(q) => (0..3).try_for_each(|_| sim.phase(q)),
            step => step.apply(sim),
        }
    }
}

/// The gates applied to fold one operator onto its pivot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    pivot: QubitId,
    steps: Vec<Step>,
    chain_start: usize, // steps[chain_start..] are the CNOT chain
}

impl Fold {
    // `None` if `stab` has no non-identity letters
    fn plan(stab: &Stabilizer, ancilla: Option<QubitId>) -> Option<Self> {
        let (lead, _) = stab.support().next()?;
        let pivot = ancilla.unwrap_or(lead);
        let mut steps: Vec<Step> = Vec::with_capacity(4 * stab.len());
        for (q, p) in stab.support() {
            match p {
                Pauli::X => { steps.push(Step::H(q)); },
                Pauli::Y => { steps.extend([Step::H(q), Step::S(q), Step::H(q)]); },
                Pauli::Z | Pauli::I => { },
            }
        }
        let chain_start = steps.len();
        steps.extend(
            stab.support()
                .map(|(q, _)| q)
                .filter(|q| *q != pivot)
                .map(|q| Step::Cnot(q, pivot))
        );
        Some(Self { pivot, steps, chain_start })
    }

    /// Apply the fold of `stab` to `sim`, collecting its parity on the lead
    /// qubit, or on `ancilla` if given.
    ///
    /// Returns `Ok(None)` without touching `sim` if `stab` is all identities.
    /// If a gate fails part-way, the gates already applied are undone before
    /// the error is returned.
    pub fn fold_in<S>(sim: &mut S, stab: &Stabilizer, ancilla: Option<QubitId>)
        -> SimResult<Option<Self>>
    where S: Simulator + ?Sized
    {
        let Some(fold) = Self::plan(stab, ancilla) else { return Ok(None); };
        trace!("fold in {} onto {} ({} gates)", stab, fold.pivot, fold.steps.len());
        for (k, step) in fold.steps.iter().enumerate() {
            if let Err(err) = step.apply(sim) {
                // report the first failure, not any from the rollback
                fold.steps[..k].iter().rev()
                    .for_each(|done| { done.undo(sim).ok(); });
                return Err(err);
            }
        }
        Ok(Some(fold))
    }

    /// The qubit whose Z eigenvalue now equals the folded operator's.
    pub fn pivot(&self) -> QubitId { self.pivot }

    /// Undo the CNOT chain, then each basis change.
    pub fn fold_out<S>(self, sim: &mut S) -> SimResult<()>
    where S: Simulator + ?Sized
    {
        trace!("fold out of {}", self.pivot);
        let (basis, chain) = self.steps.split_at(self.chain_start);
        chain.iter().try_for_each(|step| step.undo(sim))?;
        basis.iter().rev().try_for_each(|step| step.undo(sim))
    }
}

/// Allocate a temporary qubit, hand it to `f` and free it again, whether or
/// not `f` succeeds.
pub fn with_ancilla<S, T, F>(sim: &mut S, f: F) -> SimResult<T>
where
    S: Simulator + ?Sized,
    F: FnOnce(&mut S, QubitId) -> SimResult<T>,
{
    let a = sim.allocate()?;
    trace!("ancilla {} acquired", a);
    let out = f(sim, a);
    let freed = sim.free(a);
    trace!("ancilla {} released", a);
    let val = out?;
    freed?;
    Ok(val)
}

/// Fold `stab` in, run `f` on the pivot, and fold back out.
///
/// Fold-out runs even when `f` fails, in which case `f`'s error is the one
/// returned. Returns `Ok(None)` without calling `f` if `stab` is all
/// identities.
pub fn folded<S, T, F>(sim: &mut S, stab: &Stabilizer, pivot: Pivot, f: F)
    -> SimResult<Option<T>>
where
    S: Simulator + ?Sized,
    F: FnOnce(&mut S, QubitId) -> SimResult<T>,
{
    fn run<S, T, F>(
        sim: &mut S,
        stab: &Stabilizer,
        ancilla: Option<QubitId>,
        f: F,
    ) -> SimResult<Option<T>>
    where
        S: Simulator + ?Sized,
        F: FnOnce(&mut S, QubitId) -> SimResult<T>,
    {
        let Some(fold) = Fold::fold_in(sim, stab, ancilla)? else {
            return Ok(None);
        };
        let out = f(sim, fold.pivot());
        let undone = fold.fold_out(sim);
        let val = out?;
        undone?;
        Ok(Some(val))
    }

    match pivot {
        _ if stab.support().next().is_none() => Ok(None),
        Pivot::Lead => run(sim, stab, None, f),
        Pivot::Ancilla => with_ancilla(sim, |sim, a| run(sim, stab, Some(a), f)),
    }
}

pub(crate) fn check_measurable(stab: &Stabilizer) -> SimResult<()> {
    if stab.is_empty() {
        Err(SimError::unsupported(stab, "operator acts on no qubits"))
    } else if !stab.word().is_hermitian() {
        Err(SimError::unsupported(stab, "imaginary phase; not an observable"))
    } else {
        Ok(())
    }
}

/// Measure `stab` on `sim`.
///
/// `bias` is the probability of a `true` (-1 eigenvalue) outcome if the
/// result is random. An all-identity operator is deterministic and never
/// touches `sim`.
pub fn measure<S>(sim: &mut S, stab: &Stabilizer, bias: Option<f64>, pivot: Pivot)
    -> SimResult<Measurement>
where S: Simulator + ?Sized
{
    check_measurable(stab)?;
    let negative = stab.word().is_negative();
    let bias
        = sim::check_bias(bias)?
        .map(|b| if negative { 1.0 - b } else { b });
    let m
        = folded(sim, stab, pivot, |sim, p| sim.measure(p, bias))?
        .unwrap_or(Measurement::deterministic(false));
    Ok(Measurement { result: m.result ^ negative, random: m.random })
}

/// Probability that measuring `stab` on `sim` would give `true`, without
/// disturbing the state.
pub fn probability<S>(sim: &mut S, stab: &Stabilizer, pivot: Pivot)
    -> SimResult<f64>
where S: Simulator + ?Sized
{
    check_measurable(stab)?;
    let p
        = folded(sim, stab, pivot, |sim, p| sim.probability(p))?
        .unwrap_or(0.0);
    Ok(if stab.word().is_negative() { 1.0 - p } else { p })
}
