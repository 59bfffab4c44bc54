use serde::{Deserialize, Serialize};

use super::scoring::ScoringModel;
use super::tables::AlignState;
use crate::errors::GemelliError;

/// Gap marker used in aligned output strings.
pub const GAP: u8 = b'-';

/// One step of the optimal path: the state reached and the table
/// coordinates, ordered from the origin `(Match, 0, 0)` to `(k0, m, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentStep {
    pub state: AlignState,
    pub i: usize,
    pub j: usize,
}

impl AlignmentStep {
    pub fn new(state: AlignState, i: usize, j: usize) -> Self {
        Self { state, i, j }
    }
}

/// A reconstructed optimal alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentResult {
    /// The optimal global alignment score
    pub score: i64,

    /// Optimal path from the origin to the terminal cell
    pub path: Vec<AlignmentStep>,

    /// Sequence X with gap markers inserted
    pub aligned_x: Vec<u8>,

    /// Sequence Y with gap markers inserted
    pub aligned_y: Vec<u8>,
}

/// Recompute the score of an alignment from its aligned strings, applying
/// affine gap accounting per column. Used to cross-check engine output.
pub fn score_of_alignment(
    aligned_x: &[u8],
    aligned_y: &[u8],
    model: &impl ScoringModel,
) -> Result<i64, GemelliError> {
    let mut score = 0;
    let mut prev_state = AlignState::Match;

    for (&a, &b) in aligned_x.iter().zip(aligned_y) {
        let state = match (a, b) {
            (GAP, GAP) => return Err(GemelliError::InvalidSequenceInput(
                "alignment column with gaps on both sides".to_string())),
            (GAP, _) => AlignState::Insertion,
            (_, GAP) => AlignState::Deletion,
            _ => AlignState::Match,
        };

        score += match state {
            AlignState::Match => model.substitution(a, b)?,
            _ if state == prev_state => model.gap_extend(),
            _ => model.gap_open(),
        };
        prev_state = state;
    }

    Ok(score)
}

/// Render a three-line alignment view: sequence X, a midline marking
/// matches (`|`), mismatches (`*`) and gaps (space), and sequence Y.
pub fn print_alignment(aligned_x: &[u8], aligned_y: &[u8]) -> String {
    let mut mid_chars = Vec::with_capacity(aligned_x.len());

    for (&a, &b) in aligned_x.iter().zip(aligned_y) {
        mid_chars.push(if a == GAP || b == GAP {
            b' '
        } else if a == b {
            b'|'
        } else {
            b'*'
        });
    }

    format!(
        "{}\n{}\n{}",
        String::from_utf8_lossy(aligned_x),
        String::from_utf8_lossy(&mid_chars),
        String::from_utf8_lossy(aligned_y),
    )
}

#[cfg(test)]
mod tests {
    use super::{print_alignment, score_of_alignment};
    use crate::aligner::scoring::SubstitutionMatrix;

    #[test]
    fn test_score_of_alignment_with_affine_gaps() {
        let model = SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -2, -1);

        // Two matches and a single opened gap
        assert_eq!(score_of_alignment(b"A-C", b"AGC", &model).unwrap(), 2 - 2 + 2);

        // A gap of length three costs one open plus two extends
        assert_eq!(score_of_alignment(b"A---C", b"AGGTC", &model).unwrap(), 2 - 2 - 1 - 1 + 2);

        // Separate gaps each pay the open score again
        assert_eq!(score_of_alignment(b"A-C-", b"AGCT", &model).unwrap(), 2 - 2 + 2 - 2);
    }

    #[test]
    fn test_both_gaps_in_one_column_is_rejected() {
        let model = SubstitutionMatrix::match_mismatch(b"AC", 1, -1, -2, -1);
        assert!(score_of_alignment(b"A-", b"A-", &model).is_err());
    }

    #[test]
    fn test_print_alignment_midline() {
        let rendered = print_alignment(b"A-CT", b"AGCA");
        assert_eq!(rendered, "A-CT\n| |*\nAGCA");
    }
}
