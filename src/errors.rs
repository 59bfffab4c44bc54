use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

use crate::aligner::tables::AlignState;

#[derive(Debug)]
pub enum GemelliError {
    /// The scoring model has no entry for a symbol pair required by the inputs
    MissingScoreEntry(u8, u8),

    /// A gap parameter (`alpha` or `beta`) was absent from the score configuration
    MissingGapParameter(&'static str),

    /// The score configuration file could not be parsed
    InvalidConfig { line: usize, reason: String },

    /// The sequence input did not contain two sequences to align
    InvalidSequenceInput(String),

    /// Traceback reached a cell with no valid predecessor before the origin,
    /// indicating an internal bug in the table fill
    InconsistentTableState { state: AlignState, i: usize, j: usize },

    /// Other IO errors
    IOError(io::Error),

    /// Other miscellaneous gemelli errors
    Other,
}

impl Error for GemelliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::IOError(ref source) => Some(source),
            _ => None
        }
    }
}

impl From<io::Error> for GemelliError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl Display for GemelliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::MissingScoreEntry(a, b) =>
                write!(f, "The scoring model has no substitution score for the symbol pair ({}, {})!",
                       char::from(a), char::from(b)),
            Self::MissingGapParameter(name) =>
                write!(f, "The score configuration does not define the gap parameter '{name}'!"),
            Self::InvalidConfig { line, ref reason } =>
                write!(f, "Could not parse score configuration at line {line}: {reason}"),
            Self::InvalidSequenceInput(ref reason) =>
                write!(f, "Invalid sequence input: {reason}"),
            Self::InconsistentTableState { state, i, j } =>
                write!(f, "Traceback reached cell ({state:?}, {i}, {j}) with no valid predecessor \
                           before the origin, the DP tables are inconsistent!"),
            Self::IOError(ref err) =>
                err.fmt(f),
            Self::Other =>
                write!(f, "Gemelli error!")
        }
    }
}
