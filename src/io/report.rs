use std::io::Write;

use itertools::Itertools;
use serde::Serialize;

use crate::aligner::alignment::{print_alignment, AlignmentResult, AlignmentStep};
use crate::aligner::offsets::OffsetType;
use crate::aligner::scoring::{ScoringModel, SubstitutionMatrix};
use crate::aligner::tables::{AlignState, DpTables, StateMatrix};
use crate::errors::GemelliError;
use crate::io::seq::SequencePair;

/// Three-line alignment view with the final score.
pub fn write_pretty<W: Write>(
    writer: &mut W,
    pair: &SequencePair,
    result: &AlignmentResult,
) -> Result<(), GemelliError> {
    writeln!(writer, "{} vs {}", pair.name_x, pair.name_y)?;
    writeln!(writer, "{}", print_alignment(&result.aligned_x, &result.aligned_y))?;
    writeln!(writer, "Score: {}", result.score)?;

    Ok(())
}

/// Full text report: aligned strings, traceback path, final score, and
/// (when tables are given) the per-state score and predecessor tables.
pub fn write_report<W, O>(
    writer: &mut W,
    result: &AlignmentResult,
    tables: Option<&DpTables<O>>,
) -> Result<(), GemelliError>
where
    W: Write,
    O: OffsetType,
{
    writeln!(writer, "Aligned Sequence X:")?;
    writeln!(writer, "{}\n", String::from_utf8_lossy(&result.aligned_x))?;

    writeln!(writer, "Aligned Sequence Y:")?;
    writeln!(writer, "{}\n", String::from_utf8_lossy(&result.aligned_y))?;

    writeln!(writer, "Traceback Path (i, j, k):")?;
    writeln!(writer, "{}\n", format_path(&result.path))?;

    writeln!(writer, "Final Alignment Score: {}\n", result.score)?;

    if let Some(tables) = tables {
        for (state, name) in [
            (AlignState::Match, "Match Score Table (M)"),
            (AlignState::Insertion, "Insertion Score Table (I)"),
            (AlignState::Deletion, "Deletion Score Table (D)"),
        ] {
            writeln!(writer, "{name}:")?;
            writeln!(writer, "{}\n", score_table_tsv(tables.matrix(state)))?;
        }

        for (state, name) in [
            (AlignState::Match, "Match Traceback Table (M_prev)"),
            (AlignState::Insertion, "Insertion Traceback Table (I_prev)"),
            (AlignState::Deletion, "Deletion Traceback Table (D_prev)"),
        ] {
            writeln!(writer, "{name}:")?;
            writeln!(writer, "{}\n", pred_table_tsv(tables.matrix(state)))?;
        }
    }

    Ok(())
}

fn format_path(path: &[AlignmentStep]) -> String {
    path.iter()
        .map(|step| format!("({},{},{})", step.i, step.j, step.state.index()))
        .join(" <- ")
}

/// Tab-separated score table rows, with `-inf` for unreachable cells.
pub fn score_table_tsv<O: OffsetType>(matrix: &StateMatrix<O>) -> String {
    (0..matrix.n_rows())
        .map(|i| (0..matrix.n_cols())
            .map(|j| matrix.score(i, j).to_string())
            .join("\t"))
        .join("\n")
}

/// Tab-separated predecessor table rows: `(k,i,j)` entries or `None`.
pub fn pred_table_tsv<O: OffsetType>(matrix: &StateMatrix<O>) -> String {
    (0..matrix.n_rows())
        .map(|i| (0..matrix.n_cols())
            .map(|j| match matrix.pred(i, j) {
                Some(p) => format!("({},{},{})", p.state.index(), p.i.as_usize(), p.j.as_usize()),
                None => "None".to_string(),
            })
            .join("\t"))
        .join("\n")
}

/// Scoring model fields included in JSON reports.
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    alphabet: String,
    gap_open: i64,
    gap_extend: i64,
}

impl ModelSummary {
    pub fn new(matrix: &SubstitutionMatrix) -> Self {
        Self {
            alphabet: String::from_utf8_lossy(matrix.alphabet()).to_string(),
            gap_open: matrix.gap_open(),
            gap_extend: matrix.gap_extend(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    name_x: &'a str,
    name_y: &'a str,
    score: i64,
    aligned_x: String,
    aligned_y: String,
    path: &'a [AlignmentStep],
    model: ModelSummary,
}

/// Serialize the alignment result and a model summary as JSON.
pub fn write_json<W: Write>(
    writer: &mut W,
    pair: &SequencePair,
    result: &AlignmentResult,
    model: ModelSummary,
) -> Result<(), GemelliError> {
    let report = JsonReport {
        name_x: &pair.name_x,
        name_y: &pair.name_y,
        score: result.score,
        aligned_x: String::from_utf8_lossy(&result.aligned_x).to_string(),
        aligned_y: String::from_utf8_lossy(&result.aligned_y).to_string(),
        path: &result.path,
        model,
    };

    serde_json::to_writer_pretty(&mut *writer, &report)
        .map_err(|e| GemelliError::IOError(e.into()))?;
    writeln!(writer)?;

    Ok(())
}
