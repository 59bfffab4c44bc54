use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::offsets::OffsetType;
use super::scoring::Score;

/// Which of the three affine-gap recurrences a DP cell belongs to.
///
/// The declaration order doubles as the tie-break priority: whenever
/// candidate scores tie, `Match` wins over `Insertion` wins over `Deletion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignState {
    /// Consumes one symbol from each sequence
    Match,

    /// Gap in X, consumes a Y symbol
    Insertion,

    /// Gap in Y, consumes an X symbol
    Deletion,
}

impl AlignState {
    /// All states in tie-break priority order.
    pub const PRIORITY: [AlignState; 3] = [Self::Match, Self::Insertion, Self::Deletion];

    /// Numeric tag used in reports and debug table dumps (M=0, I=1, D=2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Match => 0,
            Self::Insertion => 1,
            Self::Deletion => 2,
        }
    }
}

/// Compact predecessor entry: the state and table coordinates the optimal
/// path came from. Pure data, no ownership concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<O>
where
    O: OffsetType,
{
    pub state: AlignState,
    pub i: O,
    pub j: O,
}

impl<O> CellRef<O>
where
    O: OffsetType,
{
    pub fn new(state: AlignState, i: usize, j: usize) -> Self {
        Self { state, i: O::new(i), j: O::new(j) }
    }
}

/// Dense `(m+1) x (n+1)` grid of scores and predecessor entries for one
/// alignment state, stored row-major in flat vectors.
pub struct StateMatrix<O>
where
    O: OffsetType,
{
    n_cols: usize,
    scores: Vec<Score>,
    preds: Vec<Option<CellRef<O>>>,
}

impl<O> StateMatrix<O>
where
    O: OffsetType,
{
    /// Preallocate for sequences of length `m` and `n`; every cell starts
    /// unreachable with no predecessor.
    pub fn new(m: usize, n: usize) -> Self {
        let num_cells = (m + 1) * (n + 1);

        Self {
            n_cols: n + 1,
            scores: vec![Score::Unreachable; num_cells],
            preds: vec![None; num_cells],
        }
    }

    #[inline]
    pub fn score(&self, i: usize, j: usize) -> Score {
        self.scores[i * self.n_cols + j]
    }

    #[inline]
    pub fn pred(&self, i: usize, j: usize) -> Option<CellRef<O>> {
        self.preds[i * self.n_cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, score: Score, pred: Option<CellRef<O>>) {
        let ix = i * self.n_cols + j;
        self.scores[ix] = score;
        self.preds[ix] = pred;
    }

    pub fn n_rows(&self) -> usize {
        self.scores.len() / self.n_cols
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
}

impl<O> Index<(usize, usize)> for StateMatrix<O>
where
    O: OffsetType,
{
    type Output = Score;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.scores[i * self.n_cols + j]
    }
}

/// The three score/predecessor grids of one alignment run, indexed by state.
pub struct DpTables<O>
where
    O: OffsetType,
{
    matrices: [StateMatrix<O>; 3],
}

impl<O> DpTables<O>
where
    O: OffsetType,
{
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            matrices: [
                StateMatrix::new(m, n),
                StateMatrix::new(m, n),
                StateMatrix::new(m, n),
            ],
        }
    }

    #[inline]
    pub fn matrix(&self, state: AlignState) -> &StateMatrix<O> {
        &self.matrices[state.index()]
    }

    #[inline]
    pub fn matrix_mut(&mut self, state: AlignState) -> &mut StateMatrix<O> {
        &mut self.matrices[state.index()]
    }

    #[inline]
    pub fn score(&self, state: AlignState, i: usize, j: usize) -> Score {
        self.matrix(state).score(i, j)
    }

    #[inline]
    pub fn pred(&self, state: AlignState, i: usize, j: usize) -> Option<CellRef<O>> {
        self.matrix(state).pred(i, j)
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignState, CellRef, DpTables, StateMatrix};
    use crate::aligner::scoring::Score;

    #[test]
    fn test_new_matrix_is_unreachable_everywhere() {
        let matrix = StateMatrix::<u32>::new(2, 3);

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), 4);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(matrix.score(i, j), Score::Unreachable);
                assert_eq!(matrix.pred(i, j), None);
            }
        }
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let mut matrix = StateMatrix::<u32>::new(2, 2);
        let pred = CellRef::new(AlignState::Insertion, 1, 0);
        matrix.set(1, 1, Score::new(-4), Some(pred));

        assert_eq!(matrix.score(1, 1), Score::new(-4));
        assert_eq!(matrix[(1, 1)], Score::new(-4));
        assert_eq!(matrix.pred(1, 1), Some(pred));
        assert_eq!(matrix.score(1, 0), Score::Unreachable);
    }

    #[test]
    fn test_tables_are_indexed_by_state() {
        let mut tables = DpTables::<u16>::new(1, 1);
        tables.matrix_mut(AlignState::Deletion).set(1, 0, Score::new(-2), None);

        assert_eq!(tables.score(AlignState::Deletion, 1, 0), Score::new(-2));
        assert_eq!(tables.score(AlignState::Match, 1, 0), Score::Unreachable);
        assert_eq!(AlignState::PRIORITY.map(AlignState::index), [0, 1, 2]);
    }
}
