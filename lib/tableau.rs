//! Stabilizer states in the Gottesman-Knill tableau representation, with
//! qubits allocated and released on demand.
//!
//! In the tableau representation, states are identified not by complex
//! amplitudes but by the set of *n*-qubit Pauli operators that stabilize them,
//! of which there are *n*. Following Aaronson and Gottesman
//! ([arXiv:quant-ph/0406196][tableau]), the *n* stabilizers are stored
//! alongside *n* "destabilizers" which, together with the stabilizers, generate
//! the full *n*-qubit Pauli group, plus one scratch row[^1]. Hadamard, S and
//! CNOT then act as *O*(*n*) bitwise updates on the columns of the binary
//! matrix, and a Z-basis measurement costs *O*(*n*<sup>2</sup>).
//!
//! Qubit handles index tableau slots. A freed slot is measured, reset to ∣0⟩
//! and handed out again by a later allocation; when every slot is taken the
//! tableau doubles in size, leaving the existing state untouched.
//!
//! # Example
//! ```
//! use clifford_cache::{ sim::Simulator, tableau::Tableau };
//!
//! let mut sim = Tableau::new(2, Some(10546));
//! let a = sim.allocate().unwrap();
//! let b = sim.allocate().unwrap();
//! sim.hadamard(a).unwrap();
//! sim.cnot(a, b).unwrap();
//!
//! let ma = sim.measure(a, None).unwrap();
//! let mb = sim.measure(b, None).unwrap();
//! assert!(ma.random);
//! assert!(!mb.random);
//! assert_eq!(ma.result, mb.result);
//! ```
//!
//! [^1]: Scratch space used when computing deterministic measurement outcomes.
//!
//! [tableau]: https://arxiv.org/abs/quant-ph/0406196

use std::fmt;
use log::trace;
use nalgebra as na;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use crate::{
    error::{ SimError, SimResult, ValidationError },
    pauli::{ Pauli, PauliWord, Phase },
    sim::{ self, Measurement, Simulator },
    stabilizer::QubitId,
};

const PW: [u32; 32] = [ // PW[i] = 2^i
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
    65536, 131072, 262144, 524288, 1048576, 2097152, 4194304, 8388608, 16777216,
    33554432, 67108864, 134217728, 268435456, 536870912, 1073741824, 2147483648
];

/// A stabilizer state over a growable pool of qubit slots.
#[derive(Clone, Debug)]
pub struct Tableau {
    n: usize, // number of slots
    // `x` and `z` are bit arrays of size (2n + 1) × n; for space efficiency,
    // the columns are packed into u32s
    x: na::DMatrix<u32>, // Pauli-X bits; size (2n + 1) × (floor(n / 32) + 1)
    z: na::DMatrix<u32>, // Pauli-Z bits; size (2n + 1) × (floor(n / 32) + 1)
    r: na::DVector<u8>, // Phases (0 for +1, 1 for i, 2 for -1, 3 for -i); size 2n + 1
    over32: usize, // = floor(n / 32) + 1
    in_use: Vec<bool>,
    rng: StdRng,
}

impl Tableau {
    /// Create a new tableau with room for `capacity` qubits before it has to
    /// grow, all slots free and in ∣0⟩.
    ///
    /// Optionally seed the internal random number generator used for random
    /// measurement outcomes.
    pub fn new(capacity: usize, seed: Option<u64>) -> Self {
        let rng
            = seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        let n = capacity;
        let over32: usize = (n >> 5) + 1;
        let mut q = Self {
            n,
            x: na::DMatrix::zeros(2 * n + 1, over32),
            z: na::DMatrix::zeros(2 * n + 1, over32),
            r: na::DVector::zeros(2 * n + 1),
            over32,
            in_use: vec![false; n],
            rng,
        };
        (0..n).for_each(|k| { q.reset_rows(k); });
        q
    }

    /// Number of slots currently held by the tableau.
    pub fn capacity(&self) -> usize { self.n }

    /// Number of slots currently handed out.
    pub fn num_allocated(&self) -> usize {
        self.in_use.iter().filter(|u| **u).count()
    }

    // destabilizer k := X_k, stabilizer k := Z_k
    fn reset_rows(&mut self, k: usize) {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        self.x.fill_row(k, 0);
        self.z.fill_row(k, 0);
        self.x.fill_row(k + self.n, 0);
        self.z.fill_row(k + self.n, 0);
        self.x[(k, k5)] = pw;
        self.z[(k + self.n, k5)] = pw;
        self.r[k] = 0;
        self.r[k + self.n] = 0;
    }

    // double the number of slots, carrying over the current state
    fn grow(&mut self) {
        let n_old = self.n;
        let n = (2 * n_old).max(1);
        let over32: usize = (n >> 5) + 1;
        trace!("growing tableau from {} to {} slots", n_old, n);
        let mut x: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let mut z: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let mut r: na::DVector<u8> = na::DVector::zeros(2 * n + 1);
        for i in 0..n_old {
            for j in 0..self.over32 {
                x[(i, j)] = self.x[(i, j)];
                z[(i, j)] = self.z[(i, j)];
                x[(i + n, j)] = self.x[(i + n_old, j)];
                z[(i + n, j)] = self.z[(i + n_old, j)];
            }
            r[i] = self.r[i];
            r[i + n] = self.r[i + n_old];
        }
        self.n = n;
        self.x = x;
        self.z = z;
        self.r = r;
        self.over32 = over32;
        self.in_use.resize(n, false);
        (n_old..n).for_each(|k| { self.reset_rows(k); });
    }

    fn slot(&self, q: QubitId) -> SimResult<usize> {
        let k = q.index();
        if self.in_use.get(k).copied().unwrap_or(false) {
            Ok(k)
        } else {
            Err(SimError::UnknownQubit(q))
        }
    }

    fn apply_h(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let mut tmp: u32;
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column_mut(k5).iter_mut()
                .zip(self.z.column_mut(k5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            tmp = *x_i_k5;
            *x_i_k5 ^= (*x_i_k5 ^ *z_i_k5) & pw;
            *z_i_k5 ^= (*z_i_k5 ^ tmp) & pw;
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    fn apply_s(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column(k5).iter()
                .zip(self.z.column_mut(k5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
            *z_i_k5 ^= *x_i_k5 & pw;
        }
        self
    }

    fn apply_x(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for (z_i_k5, r_i) in
            self.z.column(k5).iter()
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    fn apply_cnot(&mut self, a: usize, b: usize) -> &mut Self {
        let a5: usize = a >> 5;
        let b5: usize = b >> 5;
        let pwa: u32 = PW[a & 31];
        let pwb: u32 = PW[b & 31];
        let (mut xa, mut xb, mut za, mut zb): (bool, bool, bool, bool);
        for i in 0..2 * self.n {
            xa = self.x[(i, a5)] & pwa != 0;
            xb = self.x[(i, b5)] & pwb != 0;
            za = self.z[(i, a5)] & pwa != 0;
            zb = self.z[(i, b5)] & pwb != 0;
            if xa && zb && xb == za { self.r[i] = (self.r[i] + 2) % 4; }
            if xa { self.x[(i, b5)] ^= pwb; }
            if zb { self.z[(i, a5)] ^= pwa; }
        }
        self
    }

    // set row b equal to row a
    fn row_copy(&mut self, a: usize, b: usize) -> &mut Self {
        for (mut x__j, mut z__j) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__j[b] = x__j[a];
            z__j[b] = z__j[a];
        }
        self.r[b] = self.r[a];
        self
    }

    // set row k equal to the o-th observable (X_1, ..., X_n, Z_1, ..., Z_n)
    fn row_set(&mut self, o: usize, k: usize) -> &mut Self {
        let o5: usize;
        let o31: usize;
        self.x.fill_row(k, 0);
        self.z.fill_row(k, 0);
        self.r[k] = 0;
        if o < self.n {
            o5 = o >> 5;
            o31 = o & 31;
            self.x[(k, o5)] = PW[o31];
        } else {
            o5 = (o - self.n) >> 5;
            o31 = (o - self.n) & 31;
            self.z[(k, o5)] = PW[o31];
        }
        self
    }

    // return the phase (0, ..., 3) when row b's operator is left-multiplied by
    // row a's operator
    fn row_mul_phase(&self, a: usize, b: usize) -> u8 {
        let mut e: i32 = 0;
        let xa = self.x.row(a);
        let xb = self.x.row(b);
        let za = self.z.row(a);
        let zb = self.z.row(b);
        for ((&xaj, &xbj), (&zaj, &zbj)) in
            xa.iter().zip(xb.iter()).zip(za.iter().zip(zb.iter()))
        {
            for &pw in PW.iter() {
                if xaj & pw != 0 && zaj & pw == 0 {
                    if xbj & pw != 0 && zbj & pw != 0 { e += 1; }
                    if xbj & pw == 0 && zbj & pw != 0 { e -= 1; }
                }
                if xaj & pw != 0 && zaj & pw != 0 {
                    if xbj & pw == 0 && zbj & pw != 0 { e += 1; }
                    if xbj & pw != 0 && zbj & pw == 0 { e -= 1; }
                }
                if xaj & pw == 0 && zaj & pw != 0 {
                    if xbj & pw != 0 && zbj & pw == 0 { e += 1; }
                    if xbj & pw != 0 && zbj & pw != 0 { e -= 1; }
                }
            }
        }
        e = (e + i32::from(self.r[b]) + i32::from(self.r[a])).rem_euclid(4);
        e as u8
    }

    // left-multiply row b's operator by row a's operator and store the result
    // in row b
    fn row_mul(&mut self, a: usize, b: usize) -> &mut Self {
        self.r[b] = self.row_mul_phase(a, b);
        for (mut x__j, mut z__j) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__j[b] ^= x__j[a];
            z__j[b] ^= z__j[a];
        }
        self
    }

    // index of the first stabilizer with an X component on slot k; a
    // measurement of k is random iff one exists
    fn random_pivot(&self, k: usize) -> Option<usize> {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        self.x.column(k5).iter()
            .take(2 * self.n)
            .skip(self.n)
            .position(|x_qpn_k5| *x_qpn_k5 & pw != 0)
    }

    // outcome of measuring slot k, assuming `random_pivot(k)` is `None`; only
    // the scratch row is written
    fn determined_outcome(&mut self, k: usize) -> bool {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let n = self.n;
        let m: usize
            = self.x.column(k5).iter()
            .take(n)
            .position(|x_q_k5| *x_q_k5 & pw != 0)
            .unwrap_or(0);
        self.row_copy(m + n, 2 * n);
        for i in m + 1..n {
            if self.x[(i, k5)] & pw != 0 { self.row_mul(i + n, 2 * n); }
        }
        self.r[2 * n] != 0
    }

    // project slot k onto the given outcome, where `p` is its random pivot
    fn project(&mut self, k: usize, p: usize, outcome: bool) {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let n = self.n;
        self.row_copy(p + n, p);
        self.row_set(k + n, p + n);
        self.r[p + n] = 2 * u8::from(outcome);
        for i in 0..2 * n {
            if i != p && self.x[(i, k5)] & pw != 0 { self.row_mul(p, i); }
        }
    }

    fn measure_slot(&mut self, k: usize, bias: Option<f64>) -> Measurement {
        if let Some(p) = self.random_pivot(k) {
            let outcome
                = match bias {
                    Some(b) => self.rng.gen::<f64>() < b,
                    None => self.rng.gen::<bool>(),
                };
            self.project(k, p, outcome);
            Measurement::random(outcome)
        } else {
            Measurement::deterministic(self.determined_outcome(k))
        }
    }

    /// Return the current stabilizer generators, one [`PauliWord`] per slot
    /// with the `j`-th letter acting on slot `j`.
    ///
    /// Free slots are always in ∣0⟩ and so contribute a bare `Z` generator
    /// (up to multiplication by other generators).
    pub fn stabilizers(&self) -> Vec<PauliWord> {
        let n = self.n;
        (n..2 * n)
            .map(|i| {
                let ops
                    = (0..n).map(|j| {
                        let j5: usize = j >> 5;
                        let pw: u32 = PW[j & 31];
                        match (self.x[(i, j5)] & pw != 0, self.z[(i, j5)] & pw != 0) {
                            (false, false) => Pauli::I,
                            (true,  false) => Pauli::X,
                            (true,  true ) => Pauli::Y,
                            (false, true ) => Pauli::Z,
                        }
                    });
                PauliWord::new(Phase::from_int(self.r[i] as i8), ops)
            })
            .collect()
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stabs = self.stabilizers();
        let n = stabs.len();
        for (k, stab) in stabs.iter().enumerate() {
            fmt::Display::fmt(stab, f)?;
            if k + 1 < n { writeln!(f)?; }
        }
        Ok(())
    }
}

impl Simulator for Tableau {
    fn allocate(&mut self) -> SimResult<QubitId> {
        let k
            = match self.in_use.iter().position(|u| !*u) {
                Some(k) => k,
                None => {
                    let k = self.n;
                    self.grow();
                    k
                },
            };
        self.in_use[k] = true;
        Ok(QubitId::new(k))
    }

    fn free(&mut self, q: QubitId) -> SimResult<()> {
        let k = self.slot(q)?;
        if self.measure_slot(k, None).result { self.apply_x(k); }
        self.in_use[k] = false;
        Ok(())
    }

    fn hadamard(&mut self, q: QubitId) -> SimResult<()> {
        let k = self.slot(q)?;
        self.apply_h(k);
        Ok(())
    }

    fn phase(&mut self, q: QubitId) -> SimResult<()> {
        let k = self.slot(q)?;
        self.apply_s(k);
        Ok(())
    }

    fn cnot(&mut self, control: QubitId, target: QubitId) -> SimResult<()> {
        let a = self.slot(control)?;
        let b = self.slot(target)?;
        if a == b {
            return Err(ValidationError::DuplicateQubit(control).into());
        }
        self.apply_cnot(a, b);
        Ok(())
    }

    fn measure(&mut self, q: QubitId, bias: Option<f64>)
        -> SimResult<Measurement>
    {
        let bias = sim::check_bias(bias)?;
        let k = self.slot(q)?;
        Ok(self.measure_slot(k, bias))
    }

    fn probability(&mut self, q: QubitId) -> SimResult<f64> {
        let k = self.slot(q)?;
        if self.random_pivot(k).is_some() {
            Ok(0.5)
        } else if self.determined_outcome(k) {
            Ok(1.0)
        } else {
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn words(tab: &Tableau) -> Vec<String> {
        tab.stabilizers().iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn fresh_qubits_are_zero() {
        let mut tab = Tableau::new(3, Some(10546));
        let qs: Vec<QubitId>
            = (0..3).map(|_| tab.allocate().unwrap()).collect();
        for q in qs {
            assert_eq!(tab.measure(q, None).unwrap(), Measurement::deterministic(false));
            assert_eq!(tab.probability(q).unwrap(), 0.0);
        }
        assert_eq!(words(&tab), ["+ZII", "+IZI", "+IIZ"]);
    }

    #[test]
    fn hadamard_measurement_becomes_deterministic() {
        let mut tab = Tableau::new(1, Some(10546));
        let a = tab.allocate().unwrap();
        tab.hadamard(a).unwrap();
        assert_eq!(tab.probability(a).unwrap(), 0.5);
        let m = tab.measure(a, None).unwrap();
        assert!(m.random);
        let again = tab.measure(a, None).unwrap();
        assert_eq!(again, Measurement::deterministic(m.result));
        assert_eq!(tab.probability(a).unwrap(), if m.result { 1.0 } else { 0.0 });
    }

    #[test]
    fn bias_selects_random_outcome() {
        for outcome in [false, true] {
            for seed in 0..8 {
                let mut tab = Tableau::new(1, Some(seed));
                let a = tab.allocate().unwrap();
                tab.hadamard(a).unwrap();
                let bias = if outcome { 1.0 } else { 0.0 };
                assert_eq!(
                    tab.measure(a, Some(bias)).unwrap(),
                    Measurement::random(outcome),
                );
            }
        }
    }

    #[test]
    fn bias_ignored_when_determined() {
        let mut tab = Tableau::new(1, Some(10546));
        let a = tab.allocate().unwrap();
        assert_eq!(
            tab.measure(a, Some(1.0)).unwrap(),
            Measurement::deterministic(false),
        );
        assert_eq!(tab.measure(a, Some(1.5)), Err(SimError::InvalidBias(1.5)));
    }

    #[test]
    fn phase_cycles() {
        let mut tab = Tableau::new(1, Some(10546));
        let a = tab.allocate().unwrap();
        // H S S H = X
        tab.hadamard(a).unwrap();
        tab.phase(a).unwrap();
        tab.phase(a).unwrap();
        tab.hadamard(a).unwrap();
        assert_eq!(tab.measure(a, None).unwrap(), Measurement::deterministic(true));
        // H S^4 H = I
        tab.hadamard(a).unwrap();
        (0..4).for_each(|_| { tab.phase(a).unwrap(); });
        tab.hadamard(a).unwrap();
        assert_eq!(tab.measure(a, None).unwrap(), Measurement::deterministic(true));
    }

    #[test]
    fn bell_pair() {
        let mut tab = Tableau::new(2, Some(10546));
        let a = tab.allocate().unwrap();
        let b = tab.allocate().unwrap();
        tab.hadamard(a).unwrap();
        tab.cnot(a, b).unwrap();
        assert_eq!(words(&tab), ["+XX", "+ZZ"]);
        let before = words(&tab);
        assert_eq!(tab.probability(b).unwrap(), 0.5);
        assert_eq!(words(&tab), before);
        let ma = tab.measure(a, None).unwrap();
        let mb = tab.measure(b, None).unwrap();
        assert!(ma.random);
        assert_eq!(mb, Measurement::deterministic(ma.result));
    }

    #[test]
    fn growth_keeps_state() {
        let mut tab = Tableau::new(1, Some(10546));
        let a = tab.allocate().unwrap();
        tab.hadamard(a).unwrap();
        let qs: Vec<QubitId>
            = (0..40).map(|_| tab.allocate().unwrap()).collect();
        assert!(tab.capacity() >= 41);
        assert_eq!(tab.num_allocated(), 41);
        for q in qs.iter() { tab.cnot(a, *q).unwrap(); }
        let ma = tab.measure(a, None).unwrap();
        assert!(ma.random);
        for q in qs {
            assert_eq!(tab.measure(q, None).unwrap(), Measurement::deterministic(ma.result));
        }
    }

    #[test]
    fn free_resets_and_recycles() {
        let mut tab = Tableau::new(2, Some(10546));
        let a = tab.allocate().unwrap();
        let b = tab.allocate().unwrap();
        tab.hadamard(a).unwrap();
        tab.cnot(a, b).unwrap();
        tab.free(a).unwrap();
        assert_eq!(tab.num_allocated(), 1);
        assert_eq!(tab.hadamard(a), Err(SimError::UnknownQubit(a)));
        // b was left in a definite state by the implicit measurement
        assert!(!tab.measure(b, None).unwrap().random);
        let c = tab.allocate().unwrap();
        assert_eq!(c, a);
        assert_eq!(tab.measure(c, None).unwrap(), Measurement::deterministic(false));
    }

    #[test]
    fn rejects_bad_handles() {
        let mut tab = Tableau::new(2, None);
        let a = tab.allocate().unwrap();
        let ghost = QubitId::new(7);
        assert_eq!(tab.measure(ghost, None), Err(SimError::UnknownQubit(ghost)));
        assert_eq!(tab.cnot(a, ghost), Err(SimError::UnknownQubit(ghost)));
        assert!(tab.cnot(a, a).unwrap_err().is_validation());
        // allocated-but-unused slot
        assert_eq!(
            tab.probability(QubitId::new(1)),
            Err(SimError::UnknownQubit(QubitId::new(1))),
        );
    }
}
