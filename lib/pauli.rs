//! Pauli operators on one and many qubits.
//!
//! A [`PauliWord`] is an ordered string of single-qubit Paulis with an overall
//! phase restricted to integer powers of *i*. Words are not bound to any
//! particular qubits here; see [`Stabilizer`][crate::stabilizer::Stabilizer]
//! for that.
//!
//! The text form is an optional sign prefix (`+`, `-`, `i`, `+i`, or `-i`)
//! followed by one letter per position from `IXYZ`:
//! ```
//! use clifford_cache::pauli::{ PauliWord, Phase };
//!
//! let zz: PauliWord = "ZZ".parse().unwrap();
//! let xx: PauliWord = "-XX".parse().unwrap();
//! let yy = zz.times(&xx);
//! assert_eq!(yy.to_string(), "+YY");
//! assert_eq!(yy.phase(), Phase::Pi0);
//! ```

use std::{ fmt, ops::{ Mul, MulAssign }, str::FromStr };
use itertools::{ EitherOrBoth, Itertools };
use num_complex::Complex64 as C64;
use crate::error::ValidationError;

/// The argument of a complex phase factor, limited to integer multiples of
/// π/2.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// +1
    #[default]
    Pi0,
    /// +i
    Pi1h,
    /// -1
    Pi,
    /// -i
    Pi3h,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Pi0 => write!(f, "+"),
            Self::Pi1h => write!(f, "+i"),
            Self::Pi => write!(f, "-"),
            Self::Pi3h => write!(f, "-i"),
        }
    }
}

impl Phase {
    /// Convert to the bare power of *i*.
    pub fn to_int(self) -> u8 {
        match self {
            Self::Pi0  => 0,
            Self::Pi1h => 1,
            Self::Pi   => 2,
            Self::Pi3h => 3,
        }
    }

    /// Convert from a bare power of *i* (modulo 4).
    pub fn from_int(i: i8) -> Self {
        match i.rem_euclid(4) {
            0 => Self::Pi0,
            1 => Self::Pi1h,
            2 => Self::Pi,
            3 => Self::Pi3h,
            _ => unreachable!(),
        }
    }

    /// Multiply by -1.
    pub fn negated(self) -> Self { Self::from_int(self.to_int() as i8 + 2) }

    /// Return `true` for ±1.
    pub fn is_real(self) -> bool { matches!(self, Self::Pi0 | Self::Pi) }

    pub fn as_complex(self) -> C64 {
        match self {
            Self::Pi0  => 1.0_f64.into(),
            Self::Pi1h => C64::i(),
            Self::Pi   => (-1.0_f64).into(),
            Self::Pi3h => -C64::i(),
        }
    }
}

impl Mul for Phase {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_int((self.to_int() + rhs.to_int()) as i8)
    }
}

impl MulAssign for Phase {
    fn mul_assign(&mut self, rhs: Self) { *self = *self * rhs; }
}

/// A single-qubit Pauli operator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pauli {
    /// Identity
    #[default]
    I,
    /// σ<sub>*x*</sub>
    X,
    /// σ<sub>*y*</sub>
    Y,
    /// σ<sub>*z*</sub>
    Z,
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I => write!(f, "{}", if f.alternate() { "." } else { "I" }),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl Pauli {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::I),
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            _ => None,
        }
    }

    /// Return `true` if `self` is the identity.
    pub fn is_identity(self) -> bool { self == Self::I }

    /// Return `true` if `self` and `other` commute as single-qubit operators.
    pub fn commutes_with(self, other: Self) -> bool {
        match (self, other) {
            (_, Self::I) => true,
            (Self::I, _) => true,
            (a, b) => a == b,
        }
    }

    /// Single-qubit product `self · other`, as a phase and a Pauli.
    pub fn product(self, other: Self) -> (Phase, Self) {
        use Pauli::*;
        match (self, other) {
            (I, p) | (p, I) => (Phase::Pi0, p),
            (a, b) if a == b => (Phase::Pi0, I),
            (X, Y) => (Phase::Pi1h, Z),
            (Y, Z) => (Phase::Pi1h, X),
            (Z, X) => (Phase::Pi1h, Y),
            (Y, X) => (Phase::Pi3h, Z),
            (Z, Y) => (Phase::Pi3h, X),
            (X, Z) => (Phase::Pi3h, Y),
            _ => unreachable!(),
        }
    }
}

/// An ordered string of Paulis with an overall phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PauliWord {
    phase: Phase,
    ops: Vec<Pauli>,
}

impl PauliWord {
    pub fn new<I>(phase: Phase, ops: I) -> Self
    where I: IntoIterator<Item = Pauli>
    {
        Self { phase, ops: ops.into_iter().collect() }
    }

    /// The `n`-letter identity with phase +1.
    pub fn identity(n: usize) -> Self {
        Self { phase: Phase::Pi0, ops: vec![Pauli::I; n] }
    }

    /// A single letter with phase +1.
    pub fn single(op: Pauli) -> Self { Self { phase: Phase::Pi0, ops: vec![op] } }

    pub fn len(&self) -> usize { self.ops.len() }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    pub fn phase(&self) -> Phase { self.phase }

    pub fn letters(&self) -> &[Pauli] { &self.ops }

    pub fn get(&self, k: usize) -> Option<Pauli> { self.ops.get(k).copied() }

    /// Number of non-identity letters.
    pub fn weight(&self) -> usize {
        self.ops.iter().filter(|p| !p.is_identity()).count()
    }

    /// Return `true` if the overall phase is ±1, i.e. `self` is an observable.
    pub fn is_hermitian(&self) -> bool { self.phase.is_real() }

    /// Return `true` if the overall phase is exactly -1.
    pub fn is_negative(&self) -> bool { self.phase == Phase::Pi }

    /// Return `self` multiplied by -1.
    pub fn negate(&self) -> Self {
        Self { phase: self.phase.negated(), ops: self.ops.clone() }
    }

    /// Algebraic product `self · other`.
    ///
    /// Positions are matched by index; the shorter word is padded with
    /// identities.
    pub fn times(&self, other: &Self) -> Self {
        let mut phase = self.phase * other.phase;
        let ops: Vec<Pauli>
            = self.ops.iter().zip_longest(other.ops.iter())
            .map(|pair| {
                match pair {
                    EitherOrBoth::Both(a, b) => {
                        let (ph, p) = a.product(*b);
                        phase *= ph;
                        p
                    },
                    EitherOrBoth::Left(p) | EitherOrBoth::Right(p) => *p,
                }
            })
            .collect();
        Self { phase, ops }
    }

    pub(crate) fn permuted(&self, order: &[usize]) -> Self {
        Self { phase: self.phase, ops: order.iter().map(|&k| self.ops[k]).collect() }
    }
}

impl fmt::Display for PauliWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.phase, f)?;
        self.ops.iter()
            .try_for_each(|p| fmt::Display::fmt(p, f))
    }
}

impl FromStr for PauliWord {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (phase, rest)
            = [("+i", Phase::Pi1h), ("-i", Phase::Pi3h), ("i", Phase::Pi1h),
               ("+", Phase::Pi0), ("-", Phase::Pi)]
            .into_iter()
            .find_map(|(prefix, ph)| s.strip_prefix(prefix).map(|r| (ph, r)))
            .unwrap_or((Phase::Pi0, s));
        let offs = s.chars().count() - rest.chars().count();
        let ops: Vec<Pauli>
            = rest.chars().enumerate()
            .map(|(k, ch)| {
                Pauli::from_char(ch)
                    .ok_or(ValidationError::InvalidChar { ch, pos: k + offs })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { phase, ops })
    }
}

impl From<Pauli> for PauliWord {
    fn from(op: Pauli) -> Self { Self::single(op) }
}

#[cfg(test)]
mod test {
    use super::*;

    fn word(s: &str) -> PauliWord { s.parse().unwrap() }

    #[test]
    fn single_qubit_table() {
        use Pauli::*;
        assert_eq!(X.product(Y), (Phase::Pi1h, Z));
        assert_eq!(Y.product(Z), (Phase::Pi1h, X));
        assert_eq!(Z.product(X), (Phase::Pi1h, Y));
        assert_eq!(Y.product(X), (Phase::Pi3h, Z));
        assert_eq!(Z.product(Y), (Phase::Pi3h, X));
        assert_eq!(X.product(Z), (Phase::Pi3h, Y));
        for p in [I, X, Y, Z] {
            assert_eq!(p.product(p), (Phase::Pi0, I));
            assert_eq!(I.product(p), (Phase::Pi0, p));
            assert_eq!(p.product(I), (Phase::Pi0, p));
        }
    }

    #[test]
    fn parse_prefixes() {
        assert_eq!(word("XYZ").phase(), Phase::Pi0);
        assert_eq!(word("+XYZ").phase(), Phase::Pi0);
        assert_eq!(word("-XYZ").phase(), Phase::Pi);
        assert_eq!(word("iX").phase(), Phase::Pi1h);
        assert_eq!(word("+iX").phase(), Phase::Pi1h);
        assert_eq!(word("-iX").phase(), Phase::Pi3h);
        assert_eq!(word("-XYZ").letters(), &[Pauli::X, Pauli::Y, Pauli::Z]);
        assert_eq!(word("").len(), 0);
        assert_eq!(word("-").len(), 0);
    }

    #[test]
    fn display_parses_back() {
        for s in ["+IXYZ", "-ZZ", "+iY", "-iXI", "+"] {
            let w = word(s);
            assert_eq!(w.to_string(), s);
            assert_eq!(word(&w.to_string()), w);
        }
        assert_eq!(format!("{:#}", word("XIZ")), "+X.Z");
    }

    #[test]
    fn parse_rejects_bad_chars() {
        assert_eq!(
            "XQZ".parse::<PauliWord>(),
            Err(ValidationError::InvalidChar { ch: 'Q', pos: 1 }),
        );
        assert_eq!(
            "-Zx".parse::<PauliWord>(),
            Err(ValidationError::InvalidChar { ch: 'x', pos: 2 }),
        );
        assert_eq!(
            "X-".parse::<PauliWord>(),
            Err(ValidationError::InvalidChar { ch: '-', pos: 1 }),
        );
        assert_eq!(
            "ii".parse::<PauliWord>(),
            Err(ValidationError::InvalidChar { ch: 'i', pos: 1 }),
        );
    }

    #[test]
    fn times_accumulates_phase() {
        assert_eq!(word("XX").times(&word("ZZ")), word("-YY"));
        assert_eq!(word("XY").times(&word("YX")), word("ZZ"));
        assert_eq!(word("X").times(&word("Y")), word("iZ"));
        assert_eq!(word("Y").times(&word("X")), word("-iZ"));
        assert_eq!(word("-X").times(&word("-X")), word("I"));
        assert_eq!(word("iZ").times(&word("iZ")), word("-I"));
    }

    #[test]
    fn times_pads_with_identity() {
        assert_eq!(word("XZ").times(&word("Z")), word("-iYZ"));
        assert_eq!(word("Z").times(&word("XZY")), word("iYZY"));
        assert_eq!(word("").times(&word("-XY")), word("-XY"));
    }

    #[test]
    fn phases() {
        assert_eq!(Phase::Pi1h * Phase::Pi1h, Phase::Pi);
        assert_eq!(Phase::Pi3h * Phase::Pi1h, Phase::Pi0);
        assert_eq!(Phase::Pi1h.negated(), Phase::Pi3h);
        assert_eq!(Phase::Pi1h.as_complex(), C64::i());
        assert_eq!(
            (Phase::Pi3h * Phase::Pi).as_complex(),
            Phase::Pi3h.as_complex() * Phase::Pi.as_complex(),
        );
        assert!(word("-ZZ").is_hermitian());
        assert!(!word("iZZ").is_hermitian());
        assert_eq!(word("XIZI").weight(), 2);
    }
}
