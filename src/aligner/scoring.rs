use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use nonmax::NonMaxI64;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::GemelliError;

/// A DP cell score. Cells that no valid alignment prefix can reach carry
/// [`Score::Unreachable`], which orders strictly below every reachable score
/// so it can never win a max against a real alternative.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum Score {
    Score(NonMaxI64),  // Use non-max, such that the maximum value can be used for Unreachable

    #[default]
    Unreachable
}

impl Score {
    pub fn new(value: i64) -> Self {
        Self::Score(NonMaxI64::new(value).unwrap())
    }

    /// Add a score delta, keeping unreachable cells unreachable.
    pub fn offset_by(self, delta: i64) -> Self {
        match self {
            Self::Score(v) => Self::new(v.get() + delta),
            Self::Unreachable => Self::Unreachable,
        }
    }

    pub fn value(self) -> Option<i64> {
        match self {
            Self::Score(v) => Some(v.get()),
            Self::Unreachable => None,
        }
    }

    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Score(_))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        match self {
            Self::Score(score) => match other {
                Self::Score(other_score) => score.cmp(other_score),
                Self::Unreachable => Ordering::Greater,
            },
            Self::Unreachable => match other {
                Self::Score(_) => Ordering::Less,
                Self::Unreachable => Ordering::Equal
            }
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(v) => Display::fmt(&v.get(), f),
            Self::Unreachable => write!(f, "-inf"),
        }
    }
}

/// Read-only scoring queries required by the alignment engine.
///
/// Substitution scores and the two gap parameters are treated as pure,
/// stateless lookups; an undefined symbol pair is a configuration error
/// surfaced to the caller, never defaulted.
pub trait ScoringModel {
    fn substitution(&self, a: u8, b: u8) -> Result<i64, GemelliError>;

    /// Score added when opening a gap (`alpha`, typically negative)
    fn gap_open(&self) -> i64;

    /// Score added when extending an open gap (`beta`, typically negative)
    fn gap_extend(&self) -> i64;
}

pub type Alphabet = SmallVec<[u8; 16]>;

/// Substitution matrix over an explicit alphabet, with affine gap parameters.
#[derive(Clone, Debug)]
pub struct SubstitutionMatrix {
    scores: FxHashMap<(u8, u8), i64>,
    alphabet: Alphabet,
    gap_open: i64,
    gap_extend: i64,
}

impl SubstitutionMatrix {
    pub fn new(scores: FxHashMap<(u8, u8), i64>, gap_open: i64, gap_extend: i64) -> Self {
        let mut alphabet: Alphabet = scores.keys()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        alphabet.sort_unstable();
        alphabet.dedup();

        Self { scores, alphabet, gap_open, gap_extend }
    }

    /// Uniform model: one score for identical symbol pairs, another for
    /// differing pairs, over the given alphabet.
    pub fn match_mismatch(
        alphabet: &[u8],
        match_score: i64,
        mismatch_score: i64,
        gap_open: i64,
        gap_extend: i64,
    ) -> Self {
        let scores: FxHashMap<(u8, u8), i64> = alphabet.iter()
            .cartesian_product(alphabet.iter())
            .map(|(&a, &b)| ((a, b), if a == b { match_score } else { mismatch_score }))
            .collect();

        Self::new(scores, gap_open, gap_extend)
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// Substitution entries in alphabet order, as written to a score
    /// configuration file.
    pub fn entries(&self) -> impl Iterator<Item = (u8, u8, i64)> + '_ {
        self.alphabet.iter()
            .cartesian_product(self.alphabet.iter())
            .filter_map(|(&a, &b)| self.scores.get(&(a, b)).map(|&s| (a, b, s)))
    }
}

impl ScoringModel for SubstitutionMatrix {
    fn substitution(&self, a: u8, b: u8) -> Result<i64, GemelliError> {
        self.scores.get(&(a, b))
            .copied()
            .ok_or(GemelliError::MissingScoreEntry(a, b))
    }

    fn gap_open(&self) -> i64 {
        self.gap_open
    }

    fn gap_extend(&self) -> i64 {
        self.gap_extend
    }
}
