pub mod alignment;
pub mod offsets;
pub mod scoring;
pub mod tables;

use ahash::AHashSet;
use tracing::{debug, trace};

use crate::errors::GemelliError;
use alignment::{AlignmentResult, AlignmentStep, GAP};
use offsets::OffsetType;
use scoring::{Score, ScoringModel};
use tables::{AlignState, CellRef, DpTables};

pub use scoring::SubstitutionMatrix;

/// Exact global pairwise aligner under the three-state affine gap model.
///
/// Each call to [`align`](PairwiseAligner::align) is a pure function of the
/// two sequences and the scoring model: it fills fresh Match/Insertion/
/// Deletion score and predecessor tables bottom-up, selects the optimum at
/// `(m, n)`, and walks the predecessors back to the origin to reconstruct
/// one optimal alignment. Ties are broken Match > Insertion > Deletion, so
/// identical inputs always reproduce the identical alignment.
pub struct PairwiseAligner<C> {
    model: C,
}

impl<C> PairwiseAligner<C>
where
    C: ScoringModel,
{
    pub fn new(model: C) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    /// Align `x` against `y`, returning the optimal score, path and aligned
    /// strings. The offset type `O` controls predecessor table width and
    /// must fit `max(m, n) + 1`.
    pub fn align<O>(&self, x: &[u8], y: &[u8]) -> Result<AlignmentResult, GemelliError>
    where
        O: OffsetType,
    {
        self.align_with_tables::<O>(x, y).map(|(result, _)| result)
    }

    /// As [`align`](PairwiseAligner::align), but also hands back the filled
    /// DP tables for diagnostics, so callers never re-run the fill.
    pub fn align_with_tables<O>(
        &self,
        x: &[u8],
        y: &[u8],
    ) -> Result<(AlignmentResult, DpTables<O>), GemelliError>
    where
        O: OffsetType,
    {
        self.check_model(x, y)?;

        let tables = self.fill_tables(x, y)?;
        let result = self.traceback(&tables, x, y)?;

        debug!(score = result.score, path_len = result.path.len(), "alignment complete");

        Ok((result, tables))
    }

    /// Verify the model covers every symbol pair the fill will query, so a
    /// configuration error surfaces before any table work.
    fn check_model(&self, x: &[u8], y: &[u8]) -> Result<(), GemelliError> {
        let x_symbols: AHashSet<u8> = x.iter().copied().collect();
        let y_symbols: AHashSet<u8> = y.iter().copied().collect();

        for &a in &x_symbols {
            for &b in &y_symbols {
                self.model.substitution(a, b)?;
            }
        }

        Ok(())
    }

    fn fill_tables<O>(&self, x: &[u8], y: &[u8]) -> Result<DpTables<O>, GemelliError>
    where
        O: OffsetType,
    {
        let (m, n) = (x.len(), y.len());
        let alpha = self.model.gap_open();
        let beta = self.model.gap_extend();

        debug!(m, n, alpha, beta, "filling DP tables");

        let mut tables = DpTables::new(m, n);

        // Origin; the only finite border cell outside the induced gap runs
        tables.matrix_mut(AlignState::Match).set(0, 0, Score::new(0), None);

        // First column: reachable only through a single deletion run
        for i in 1..=m {
            let pred_state = if i == 1 { AlignState::Match } else { AlignState::Deletion };
            tables.matrix_mut(AlignState::Deletion).set(
                i, 0,
                Score::new(alpha + (i as i64 - 1) * beta),
                Some(CellRef::new(pred_state, i - 1, 0)),
            );
        }

        // First row: symmetric, through a single insertion run
        for j in 1..=n {
            let pred_state = if j == 1 { AlignState::Match } else { AlignState::Insertion };
            tables.matrix_mut(AlignState::Insertion).set(
                0, j,
                Score::new(alpha + (j as i64 - 1) * beta),
                Some(CellRef::new(pred_state, 0, j - 1)),
            );
        }

        for i in 1..=m {
            for j in 1..=n {
                let subst = self.model.substitution(x[i - 1], y[j - 1])?;

                // Match: any state may precede a substitution step
                let (best, from) = best_transition(AlignState::PRIORITY
                    .map(|p| (tables.score(p, i - 1, j - 1), p)));
                let score = best.offset_by(subst);
                let pred = from.map(|p| CellRef::new(p, i - 1, j - 1));
                tables.matrix_mut(AlignState::Match).set(i, j, score, pred);

                // Insertion: open from Match or extend; never switches from Deletion
                let (score, from) = best_transition([
                    (tables.score(AlignState::Match, i, j - 1).offset_by(alpha), AlignState::Match),
                    (tables.score(AlignState::Insertion, i, j - 1).offset_by(beta), AlignState::Insertion),
                ]);
                let pred = from.map(|p| CellRef::new(p, i, j - 1));
                tables.matrix_mut(AlignState::Insertion).set(i, j, score, pred);

                // Deletion: open from Match or extend; never switches from Insertion
                let (score, from) = best_transition([
                    (tables.score(AlignState::Match, i - 1, j).offset_by(alpha), AlignState::Match),
                    (tables.score(AlignState::Deletion, i - 1, j).offset_by(beta), AlignState::Deletion),
                ]);
                let pred = from.map(|p| CellRef::new(p, i - 1, j));
                tables.matrix_mut(AlignState::Deletion).set(i, j, score, pred);
            }
        }

        Ok(tables)
    }

    fn traceback<O>(
        &self,
        tables: &DpTables<O>,
        x: &[u8],
        y: &[u8],
    ) -> Result<AlignmentResult, GemelliError>
    where
        O: OffsetType,
    {
        let (m, n) = (x.len(), y.len());

        let (terminal, terminal_state) = best_transition(AlignState::PRIORITY
            .map(|k| (tables.score(k, m, n), k)));

        // Some cell at (m, n) is always reachable once the fill succeeded
        let (Some(score), Some(k0)) = (terminal.value(), terminal_state) else {
            return Err(GemelliError::InconsistentTableState {
                state: AlignState::Match, i: m, j: n,
            });
        };

        trace!(?k0, score, "starting traceback");

        let mut path = Vec::with_capacity(m + n + 1);
        let mut aligned_x = Vec::with_capacity(m + n);
        let mut aligned_y = Vec::with_capacity(m + n);

        let (mut state, mut i, mut j) = (k0, m, n);
        while i > 0 || j > 0 {
            path.push(AlignmentStep::new(state, i, j));

            match state {
                AlignState::Match => {
                    aligned_x.push(x[i - 1]);
                    aligned_y.push(y[j - 1]);
                },
                AlignState::Insertion => {
                    aligned_x.push(GAP);
                    aligned_y.push(y[j - 1]);
                },
                AlignState::Deletion => {
                    aligned_x.push(x[i - 1]);
                    aligned_y.push(GAP);
                },
            }

            let Some(pred) = tables.pred(state, i, j) else {
                return Err(GemelliError::InconsistentTableState { state, i, j });
            };

            state = pred.state;
            i = pred.i.as_usize();
            j = pred.j.as_usize();
        }

        // Every valid predecessor chain ends at the origin in the Match state
        if state != AlignState::Match {
            return Err(GemelliError::InconsistentTableState { state, i: 0, j: 0 });
        }

        path.push(AlignmentStep::new(AlignState::Match, 0, 0));

        // Reconstruction ran end-to-start
        path.reverse();
        aligned_x.reverse();
        aligned_y.reverse();

        Ok(AlignmentResult { score, path, aligned_x, aligned_y })
    }
}

/// Pick the best candidate, keeping the first listed on ties so the caller's
/// ordering doubles as the tie-break priority. Returns no state when every
/// candidate is unreachable.
#[inline]
fn best_transition(
    candidates: impl IntoIterator<Item = (Score, AlignState)>,
) -> (Score, Option<AlignState>) {
    let mut best = Score::Unreachable;
    let mut best_state = None;

    for (score, state) in candidates {
        if score > best {
            best = score;
            best_state = Some(state);
        }
    }

    (best, best_state)
}

#[cfg(test)]
mod tests {
    use super::scoring::SubstitutionMatrix;
    use super::tables::AlignState;
    use super::alignment::score_of_alignment;
    use super::PairwiseAligner;
    use crate::errors::GemelliError;

    fn example_model() -> SubstitutionMatrix {
        SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -2, -1)
    }

    #[test]
    fn test_single_gap_insertion_scenario() {
        let aligner = PairwiseAligner::new(example_model());
        let result = aligner.align::<u32>(b"AC", b"AGC").unwrap();

        assert_eq!(result.score, 2 - 2 + 2);
        assert_eq!(result.aligned_x, b"A-C");
        assert_eq!(result.aligned_y, b"AGC");

        let states: Vec<_> = result.path.iter().map(|step| step.state).collect();
        assert_eq!(states, vec![
            AlignState::Match,
            AlignState::Match,
            AlignState::Insertion,
            AlignState::Match,
        ]);
        assert_eq!(result.path.first().map(|s| (s.i, s.j)), Some((0, 0)));
        assert_eq!(result.path.last().map(|s| (s.i, s.j)), Some((2, 3)));
    }

    #[test]
    fn test_empty_against_empty() {
        let aligner = PairwiseAligner::new(example_model());
        let result = aligner.align::<u32>(b"", b"").unwrap();

        assert_eq!(result.score, 0);
        assert!(result.aligned_x.is_empty());
        assert!(result.aligned_y.is_empty());
        assert_eq!(result.path.len(), 1);
    }

    #[test]
    fn test_sequence_against_empty_is_one_gap_run() {
        let aligner = PairwiseAligner::new(example_model());

        let result = aligner.align::<u32>(b"ACGT", b"").unwrap();
        assert_eq!(result.score, -2 + 3 * -1);
        assert_eq!(result.aligned_x, b"ACGT");
        assert_eq!(result.aligned_y, b"----");

        let result = aligner.align::<u32>(b"", b"ACG").unwrap();
        assert_eq!(result.score, -2 + 2 * -1);
        assert_eq!(result.aligned_x, b"---");
        assert_eq!(result.aligned_y, b"ACG");
    }

    #[test]
    fn test_reported_score_matches_recomputed_score() {
        let model = example_model();
        let aligner = PairwiseAligner::new(model.clone());

        let cases: [(&[u8], &[u8]); 4] = [
            (b"ACGT", b"AGT"),
            (b"GATTACA", b"GCATGCT"),
            (b"TTTT", b"ACGT"),
            (b"A", b"TTTTTTTT"),
        ];
        for (x, y) in cases {
            let result = aligner.align::<u32>(x, y).unwrap();
            let recomputed = score_of_alignment(&result.aligned_x, &result.aligned_y, &model).unwrap();
            assert_eq!(result.score, recomputed, "mismatch for {:?} vs {:?}",
                       std::str::from_utf8(x), std::str::from_utf8(y));
        }
    }

    #[test]
    fn test_degapping_reconstructs_the_inputs() {
        let aligner = PairwiseAligner::new(example_model());
        let (x, y) = (b"GATTACA".as_slice(), b"GCATGCT".as_slice());
        let result = aligner.align::<u32>(x, y).unwrap();

        assert_eq!(result.aligned_x.len(), result.aligned_y.len());

        let degapped_x: Vec<u8> = result.aligned_x.iter().copied().filter(|&c| c != b'-').collect();
        let degapped_y: Vec<u8> = result.aligned_y.iter().copied().filter(|&c| c != b'-').collect();
        assert_eq!(degapped_x, x);
        assert_eq!(degapped_y, y);
    }

    #[test]
    fn test_symmetric_matrix_gives_symmetric_score() {
        let aligner = PairwiseAligner::new(example_model());
        let (x, y) = (b"ACGTACGT".as_slice(), b"AGTCCT".as_slice());

        let forward = aligner.align::<u32>(x, y).unwrap();
        let backward = aligner.align::<u32>(y, x).unwrap();
        assert_eq!(forward.score, backward.score);
    }

    #[test]
    fn test_costlier_gaps_never_improve_the_score() {
        let (x, y) = (b"ACGTAC".as_slice(), b"AGTC".as_slice());

        let cheap = PairwiseAligner::new(SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -1, -1))
            .align::<u32>(x, y).unwrap();
        let pricier_open = PairwiseAligner::new(SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -4, -1))
            .align::<u32>(x, y).unwrap();
        let pricier_extend = PairwiseAligner::new(SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -1, -3))
            .align::<u32>(x, y).unwrap();

        assert!(pricier_open.score <= cheap.score);
        assert!(pricier_extend.score <= cheap.score);
    }

    #[test]
    fn test_linear_gap_model_via_equal_alpha_beta() {
        // alpha == beta recovers linear gap behavior through the same engine
        let model = SubstitutionMatrix::match_mismatch(b"ACGT", 1, -1, -2, -2);
        let aligner = PairwiseAligner::new(model);

        let result = aligner.align::<u32>(b"ACT", b"").unwrap();
        assert_eq!(result.score, 3 * -2);
    }

    #[test]
    fn test_ties_resolve_to_match_first() {
        // Every path scores zero, so tie-breaking alone decides the output
        let model = SubstitutionMatrix::match_mismatch(b"AB", 0, 0, 0, 0);
        let aligner = PairwiseAligner::new(model);
        let result = aligner.align::<u32>(b"AB", b"AB").unwrap();

        assert_eq!(result.score, 0);
        assert_eq!(result.aligned_x, b"AB");
        assert_eq!(result.aligned_y, b"AB");
        assert!(result.path.iter().all(|step| step.state == AlignState::Match));
    }

    #[test]
    fn test_repeated_calls_are_deterministic() {
        let aligner = PairwiseAligner::new(example_model());
        let first = aligner.align::<u32>(b"GATTACA", b"GCATGCT").unwrap();
        let second = aligner.align::<u32>(b"GATTACA", b"GCATGCT").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_score_entry_aborts_before_alignment() {
        let model = SubstitutionMatrix::match_mismatch(b"ACGT", 2, -1, -2, -1);
        let aligner = PairwiseAligner::new(model);

        let result = aligner.align::<u32>(b"ACN", b"ACGT");
        assert!(matches!(result, Err(GemelliError::MissingScoreEntry(b'N', _))));
    }

    /// Maximum alignment score by exhaustive enumeration, honoring the
    /// no-gap-switch rule: an insertion step may only follow Match or
    /// Insertion, a deletion step only Match or Deletion.
    fn enumerate_best(
        x: &[u8],
        y: &[u8],
        i: usize,
        j: usize,
        prev: AlignState,
        model: &SubstitutionMatrix,
    ) -> Option<i64> {
        use crate::aligner::scoring::ScoringModel;

        if i == x.len() && j == y.len() {
            return Some(0);
        }

        let mut best = None;
        if i < x.len() && j < y.len() {
            let subst = model.substitution(x[i], y[j]).unwrap();
            if let Some(rest) = enumerate_best(x, y, i + 1, j + 1, AlignState::Match, model) {
                best = best.max(Some(subst + rest));
            }
        }
        if j < y.len() && prev != AlignState::Deletion {
            let gap = if prev == AlignState::Insertion { model.gap_extend() } else { model.gap_open() };
            if let Some(rest) = enumerate_best(x, y, i, j + 1, AlignState::Insertion, model) {
                best = best.max(Some(gap + rest));
            }
        }
        if i < x.len() && prev != AlignState::Insertion {
            let gap = if prev == AlignState::Deletion { model.gap_extend() } else { model.gap_open() };
            if let Some(rest) = enumerate_best(x, y, i + 1, j, AlignState::Deletion, model) {
                best = best.max(Some(gap + rest));
            }
        }

        best
    }

    #[test]
    fn test_score_matches_exhaustive_enumeration() {
        // All sequences over {A, C} up to length 3
        let mut sequences: Vec<Vec<u8>> = vec![Vec::new()];
        for len in 1..=3usize {
            for bits in 0..(1 << len) {
                sequences.push((0..len)
                    .map(|p| if bits >> p & 1 == 0 { b'A' } else { b'C' })
                    .collect());
            }
        }

        let models = [
            SubstitutionMatrix::match_mismatch(b"AC", 2, -1, -3, -1),
            SubstitutionMatrix::match_mismatch(b"AC", 1, -2, -2, -2),
            SubstitutionMatrix::match_mismatch(b"AC", 3, 1, -4, -1),
        ];

        for model in &models {
            let aligner = PairwiseAligner::new(model.clone());
            for x in &sequences {
                for y in &sequences {
                    let result = aligner.align::<u32>(x, y).unwrap();
                    let expected = enumerate_best(x, y, 0, 0, AlignState::Match, model).unwrap();
                    assert_eq!(result.score, expected, "for {:?} vs {:?}",
                               std::str::from_utf8(x), std::str::from_utf8(y));
                }
            }
        }
    }

    #[test]
    fn test_tables_expose_the_filled_grids() {
        let aligner = PairwiseAligner::new(example_model());
        let (result, tables) = aligner.align_with_tables::<u32>(b"AC", b"AGC").unwrap();

        // The terminal Match cell carries the reported optimum
        assert_eq!(tables.score(AlignState::Match, 2, 3).value(), Some(result.score));
        assert_eq!(tables.matrix(AlignState::Match).n_rows(), 3);
        assert_eq!(tables.matrix(AlignState::Match).n_cols(), 4);
    }
}
