use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;

use crate::errors::GemelliError;

const FASTA_EXTENSIONS: [&str; 6] = [".fa", ".fa.gz", ".fna", ".fna.gz", ".fasta", ".fasta.gz"];

/// The two sequences of one alignment run, with names for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePair {
    pub name_x: String,
    pub name_y: String,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

/// Read the sequence pair to align from a file.
///
/// Files with a FASTA extension are parsed as FASTA (gzip-transparent) and
/// the first two records are used; anything else is read as raw text whose
/// first two non-empty lines are X and Y.
pub fn read_sequence_pair(path: &Path) -> Result<SequencePair, GemelliError> {
    let is_gzipped = path.file_name()
        .map(|v| v.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false);

    // Check if we have a gzipped file
    let reader: Box<dyn BufRead> = if is_gzipped {
        Box::new(File::open(path)
            .map(MultiGzDecoder::new)
            .map(BufReader::new)?)
    } else {
        Box::new(File::open(path)
            .map(BufReader::new)?)
    };

    if is_fasta_path(path) {
        read_fasta_pair(reader)
    } else {
        read_two_lines(reader)
    }
}

fn is_fasta_path(path: &Path) -> bool {
    let path_as_str = path.to_string_lossy();
    FASTA_EXTENSIONS.into_iter().any(|ext| path_as_str.ends_with(ext))
}

/// Raw pair input: the first two non-empty lines are the sequences.
pub fn read_two_lines<R: BufRead>(reader: R) -> Result<SequencePair, GemelliError> {
    let mut sequences = Vec::with_capacity(2);
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            sequences.push(trimmed.as_bytes().to_vec());
        }

        if sequences.len() == 2 {
            break;
        }
    }

    if sequences.len() < 2 {
        return Err(GemelliError::InvalidSequenceInput(
            "input file must contain at least two sequence lines".to_string()));
    }

    let y = sequences.pop().unwrap();
    let x = sequences.pop().unwrap();

    Ok(SequencePair {
        name_x: "seq_x".to_string(),
        name_y: "seq_y".to_string(),
        x,
        y,
    })
}

/// FASTA pair input: the first two records are X and Y.
pub fn read_fasta_pair<R: BufRead>(reader: R) -> Result<SequencePair, GemelliError> {
    let mut reader = fasta::io::Reader::new(reader);

    let mut records = Vec::with_capacity(2);
    for result in reader.records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        records.push((name, record.sequence().as_ref().to_vec()));

        if records.len() == 2 {
            break;
        }
    }

    if records.len() < 2 {
        return Err(GemelliError::InvalidSequenceInput(
            "FASTA input must contain at least two records".to_string()));
    }

    let (name_y, y) = records.pop().unwrap();
    let (name_x, x) = records.pop().unwrap();

    Ok(SequencePair { name_x, name_y, x, y })
}
