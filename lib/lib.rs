#![allow(non_snake_case)]

//! Memoized measurement of multi-qubit Pauli operators on a Clifford-state
//! simulator.
//!
//! Measuring an *n*-qubit Pauli operator on a stabilizer simulator means
//! rotating it onto a single qubit, measuring that qubit, and rotating back
//! ([`fold`]). When the same operators are measured over and over with few
//! gates in between, as with the stabilizers of an error-correcting code,
//! most of those measurements are already determined by earlier ones.
//! [`CachingSim`] remembers outcomes keyed by operator, and throws away only
//! the ones that later gates, frees or measurements could have changed.
//!
//! Assumes all operations will be limited to Clifford-group transformations
//! (Hadamard, S and CNOT, from which every other Clifford can be built).

pub mod error;
pub mod pauli;
pub mod stabilizer;
pub mod commute;
pub mod sim;
pub mod fold;
pub mod index;
pub mod cache;
pub mod tableau;

pub use crate::{
    cache::{ CacheConfig, CacheStats, CachingSim, KeyOrder },
    error::{ SimError, SimResult, ValidationError },
    fold::Pivot,
    pauli::{ Pauli, PauliWord, Phase },
    sim::{ Measurement, Simulator },
    stabilizer::{ Operand, QubitId, Stabilizer },
    tableau::Tableau,
};
