//! Memoizing decorator over a [`Simulator`].
//!
//! [`CachingSim`] remembers the outcome of every stabilizer measurement and
//! probability query, and answers repeats without touching the wrapped
//! simulator. Gates and frees evict whatever they could have changed;
//! measurements evict what their collapse could have changed.
//!
//! # Example
//! ```
//! use clifford_cache::{
//!     cache::CachingSim,
//!     sim::Simulator,
//!     stabilizer::Stabilizer,
//!     tableau::Tableau,
//! };
//!
//! let mut sim = CachingSim::new(Tableau::new(2, Some(10546)));
//! let a = sim.allocate().unwrap();
//! let b = sim.allocate().unwrap();
//! sim.hadamard(a).unwrap();
//! sim.cnot(a, b).unwrap();
//!
//! let xx = Stabilizer::parse([a, b], "XX").unwrap();
//! assert!(!sim.measure(&xx, None).unwrap().result);
//! assert!(!sim.measure(&xx, None).unwrap().random);
//! assert_eq!(sim.stats().hits, 1);
//! ```

use log::debug;
use crate::{
    error::{ SimError, SimResult },
    fold::{ self, Pivot },
    index::{ CacheIndex, CachedValue },
    pauli::Pauli,
    sim::{ self, Measurement, Simulator },
    stabilizer::{ Operand, QubitId, Stabilizer },
};

/// How operands are turned into cache keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyOrder {
    /// Qubits in the order the caller gave them; `XZ` on (a, b) and `ZX` on
    /// (b, a) are different keys.
    #[default]
    AsGiven,
    /// Qubits sorted ascending, so that any ordering of the same operator
    /// shares one entry.
    Canonical,
}

/// Settings for a [`CachingSim`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CacheConfig {
    pub key_order: KeyOrder,
    pub pivot: Pivot,
}

/// Running totals kept by a [`CachingSim`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Queries answered from the cache.
    pub hits: usize,
    /// Queries passed through to the wrapped simulator.
    pub misses: usize,
    /// Entries discarded as stale.
    pub evictions: usize,
}

/// A [`Simulator`] that memoizes stabilizer measurements of the one it wraps.
///
/// The wrapped simulator must only be driven through this type from the
/// moment it is wrapped; qubits allocated beforehand are unknown to the cache
/// and cannot be measured through it.
#[derive(Clone, Debug)]
pub struct CachingSim<S>
where S: Simulator
{
    sim: S,
    index: CacheIndex,
    config: CacheConfig,
    stats: CacheStats,
}

impl<S> CachingSim<S>
where S: Simulator
{
    /// Wrap `sim` with the default configuration.
    pub fn new(sim: S) -> Self { Self::with_config(sim, CacheConfig::default()) }

    pub fn with_config(sim: S, config: CacheConfig) -> Self {
        Self { sim, index: CacheIndex::new(), config, stats: CacheStats::default() }
    }

    pub fn inner(&self) -> &S { &self.sim }

    pub fn into_inner(self) -> S { self.sim }

    pub fn index(&self) -> &CacheIndex { &self.index }

    pub fn config(&self) -> CacheConfig { self.config }

    pub fn stats(&self) -> CacheStats { self.stats }

    // check that `op` can be measured here and convert it to a cache key
    fn resolve(&self, op: Operand) -> SimResult<Stabilizer> {
        let stab = op.into_stabilizer();
        fold::check_measurable(&stab)?;
        if let Some(q) = stab.qubits().iter().find(|q| !self.index.contains_qubit(**q)) {
            return Err(SimError::UnknownQubit(*q));
        }
        match self.config.key_order {
            KeyOrder::AsGiven => Ok(stab),
            KeyOrder::Canonical => Ok(stab.canonical()),
        }
    }

    fn evicted(&mut self, n: usize, cause: &dyn std::fmt::Display) {
        if n > 0 {
            debug!("evicted {} entries after {}", n, cause);
            self.stats.evictions += n;
        }
    }

    /// Measure `op`, a bare qubit (Z basis) or a [`Stabilizer`].
    ///
    /// If the outcome is random, `bias` is the probability of `true`. A cached
    /// answer is reported as deterministic and leaves the wrapped simulator
    /// alone.
    pub fn measure<O>(&mut self, op: O, bias: Option<f64>)
        -> SimResult<Measurement>
    where O: Into<Operand>
    {
        let stab = self.resolve(op.into())?;
        let bias = sim::check_bias(bias)?;
        if let Some(bit) = self.index.lookup(&stab).and_then(|e| e.value.as_bit()) {
            debug!("cache hit: measure {} = {}", stab, u8::from(bit));
            self.stats.hits += 1;
            return Ok(Measurement::deterministic(bit));
        }
        debug!("cache miss: measure {}", stab);
        self.stats.misses += 1;
        let m = fold::measure(&mut self.sim, &stab, bias, self.config.pivot)?;
        let n
            = if m.random {
                self.index.invalidate_qubits(stab.qubits())
            } else {
                self.index.invalidate_anti_commuting(&stab)
            };
        self.evicted(n, &stab);
        self.index.insert(stab, CachedValue::Bit(m.result))?;
        Ok(m)
    }

    /// Probability that measuring `op` would give `true`, without collapsing
    /// anything.
    ///
    /// Nothing cached is evicted by a probability query.
    pub fn probability<O>(&mut self, op: O) -> SimResult<f64>
    where O: Into<Operand>
    {
        let stab = self.resolve(op.into())?;
        if let Some(entry) = self.index.lookup(&stab) {
            let p = entry.value.as_probability();
            debug!("cache hit: probability {} = {}", stab, p);
            self.stats.hits += 1;
            return Ok(p);
        }
        debug!("cache miss: probability {}", stab);
        self.stats.misses += 1;
        let p = fold::probability(&mut self.sim, &stab, self.config.pivot)?;
        self.index.insert(stab, CachedValue::Probability(p))?;
        Ok(p)
    }

    /// Probability of the -1 outcome of X on `q`.
    pub fn probability_x(&mut self, q: QubitId) -> SimResult<f64> {
        self.probability(Stabilizer::single(q, Pauli::X))
    }

    /// Probability of the -1 outcome of Y on `q`.
    pub fn probability_y(&mut self, q: QubitId) -> SimResult<f64> {
        self.probability(Stabilizer::single(q, Pauli::Y))
    }

    /// Force a measurement of `op` to give `outcome`.
    ///
    /// Fails with [`SimError::PostSelectionImpossible`] if the state cannot
    /// produce `outcome`; in that case the opposite outcome has been committed.
    pub fn collapse<O>(&mut self, op: O, outcome: bool) -> SimResult<()>
    where O: Into<Operand>
    {
        let stab = self.resolve(op.into())?;
        let bias = if outcome { 1.0 } else { 0.0 };
        let m = self.measure(&stab, Some(bias))?;
        if m.result != outcome {
            return Err(SimError::PostSelectionImpossible {
                operand: stab.to_string(),
                outcome,
            });
        }
        Ok(())
    }
}

impl<S> Simulator for CachingSim<S>
where S: Simulator
{
    fn allocate(&mut self) -> SimResult<QubitId> {
        let q = self.sim.allocate()?;
        self.index.add_qubit(q);
        Ok(q)
    }

    fn free(&mut self, q: QubitId) -> SimResult<()> {
        if !self.index.contains_qubit(q) { return Err(SimError::UnknownQubit(q)); }
        let n = self.index.invalidate_qubit(q);
        self.evicted(n, &format_args!("free {}", q));
        self.sim.free(q)?;
        self.index.remove_qubit(q);
        Ok(())
    }

    fn hadamard(&mut self, q: QubitId) -> SimResult<()> {
        let n = self.index.invalidate_qubit(q);
        self.evicted(n, &format_args!("H {}", q));
        self.sim.hadamard(q)
    }

    fn phase(&mut self, q: QubitId) -> SimResult<()> {
        let n = self.index.invalidate_qubit(q);
        self.evicted(n, &format_args!("S {}", q));
        self.sim.phase(q)
    }

    fn cnot(&mut self, control: QubitId, target: QubitId) -> SimResult<()> {
        let n = self.index.invalidate_qubits([control, target].iter());
        self.evicted(n, &format_args!("CNOT {} {}", control, target));
        self.sim.cnot(control, target)
    }

    fn measure(&mut self, q: QubitId, bias: Option<f64>)
        -> SimResult<Measurement>
    {
        CachingSim::measure(self, q, bias)
    }

    fn probability(&mut self, q: QubitId) -> SimResult<f64> {
        CachingSim::probability(self, q)
    }
}
