use std::fs;
use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Registry};

use gemelli::aligner::scoring::SubstitutionMatrix;
use gemelli::aligner::tables::AlignState;
use gemelli::aligner::PairwiseAligner;
use gemelli::debug::messages::DebugOutputMessage;
use gemelli::debug::DebugOutputWriter;
use gemelli::errors::GemelliError;
use gemelli::io::config::{generate_matrix, read_score_config, write_score_config, ConfigPreset};
use gemelli::io::report;
use gemelli::io::seq::read_sequence_pair;

/// The various output formats supported by gemelli
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputType {
    /// Three-line alignment view with the final score
    Pretty,

    /// Full text report with the traceback path, optionally with DP tables
    Report,

    /// JSON rendering of the alignment result
    Json,
}

/// Matrix generator to use for `gen-config`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    /// Independent uniform scores per ordered symbol pair
    Random,

    /// One score for identical pairs, another for differing pairs
    MatchMismatch,

    /// Random scores, symmetric across the diagonal
    Symmetric,
}

impl From<PresetArg> for ConfigPreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Random => ConfigPreset::Random,
            PresetArg::MatchMismatch => ConfigPreset::MatchMismatch,
            PresetArg::Symmetric => ConfigPreset::Symmetric,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug)]
enum CliSubcommand {
    /// Globally align two sequences under an affine gap model
    Align(AlignArgs),

    /// Generate a score configuration file for an alphabet
    GenConfig(GenConfigArgs),
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// File with the two sequences to align: raw text with one sequence per
    /// line, or FASTA with at least two records (optionally gzipped).
    #[clap(help_heading = "Inputs")]
    sequences: PathBuf,

    /// Score configuration file. If not given, a match/mismatch model over
    /// the observed alphabet is built from the scoring flags below.
    #[arg(short = 'c', long)]
    #[clap(help_heading = "Inputs")]
    score_config: Option<PathBuf>,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long)]
    #[clap(help_heading = "Outputs")]
    output_type: Option<OutputType>,

    /// Append the full score and predecessor tables to the report output
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    with_tables: bool,

    /// Output debug information (per-state DP table snapshots) and write
    /// files to the given directory
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    debug_output: Option<PathBuf>,

    /// Score for aligning two identical symbols
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    match_score: i64,

    /// Score for aligning two differing symbols
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    mismatch_score: i64,

    /// Score for opening a gap (alpha)
    #[arg(short = 'g', long, default_value_t = -2, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    gap_open: i64,

    /// Score for extending a gap (beta)
    #[arg(short = 'e', long, default_value_t = -1, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    gap_extend: i64,
}

#[derive(Args, Debug)]
struct GenConfigArgs {
    /// Output path for the generated score configuration
    out: PathBuf,

    /// Alphabet to generate scores for
    #[arg(long, default_value = "ACGT")]
    alphabet: String,

    /// Matrix generator to use
    #[arg(value_enum, long, default_value = "random")]
    preset: PresetArg,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Gap open score (alpha). Random in -3..=-1 when not given
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    gap_open: Option<i64>,

    /// Gap extend score (beta). Random in -3..=-1 when not given
    #[arg(short = 'e', long, allow_negative_numbers = true)]
    gap_extend: Option<i64>,
}

/// Build our base tracing subscriber with stderr logging.
fn build_base_subscriber(verbose: u8) -> impl Subscriber + for<'span> LookupSpan<'span> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap();

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log)
}

fn align_subcommand(align_args: &AlignArgs) -> Result<()> {
    let debug_writer = align_args.debug_output.as_ref().map(DebugOutputWriter::new);

    let pair = read_sequence_pair(&align_args.sequences)
        .with_context(|| format!("Could not read sequences from {:?}", align_args.sequences))?;

    let matrix = if let Some(path) = &align_args.score_config {
        let file = File::open(path).map(BufReader::new)
            .with_context(|| format!("Could not open score configuration {path:?}"))?;
        read_score_config(file)
            .with_context(|| format!("Could not parse score configuration {path:?}"))?
    } else {
        let mut alphabet: Vec<u8> = pair.x.iter().chain(pair.y.iter()).copied().collect();
        alphabet.sort_unstable();
        alphabet.dedup();

        SubstitutionMatrix::match_mismatch(
            &alphabet,
            align_args.match_score,
            align_args.mismatch_score,
            align_args.gap_open,
            align_args.gap_extend,
        )
    };

    info!("Aligning {} ({} symbols) against {} ({} symbols)...",
          pair.name_x, pair.x.len(), pair.name_y, pair.y.len());

    let aligner = PairwiseAligner::new(matrix);

    let need_tables = align_args.with_tables || debug_writer.is_some();
    let (result, tables) = if need_tables {
        let (result, tables) = aligner.align_with_tables::<u32>(&pair.x, &pair.y)?;
        (result, Some(tables))
    } else {
        (aligner.align::<u32>(&pair.x, &pair.y)?, None)
    };

    info!("Done. Alignment score: {}", result.score);

    if let Some(debug) = &debug_writer {
        debug.log(DebugOutputMessage::NewAlignment {
            name_x: pair.name_x.clone(),
            name_y: pair.name_y.clone(),
            m: pair.x.len(),
            n: pair.y.len(),
        });

        if let Some(tables) = &tables {
            for state in AlignState::PRIORITY {
                debug.log(DebugOutputMessage::ScoreTable {
                    state,
                    tsv: report::score_table_tsv(tables.matrix(state)),
                });
                debug.log(DebugOutputMessage::PredecessorTable {
                    state,
                    tsv: report::pred_table_tsv(tables.matrix(state)),
                });
            }
        }
    }

    // Determine where to write the result to
    let mut writer: Box<dyn Write> = if let Some(path) = &align_args.output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?
        }

        let file = File::create(path)?;
        Box::new(file) as Box<dyn Write>
    } else {
        Box::new(stdout()) as Box<dyn Write>
    };

    let output_type = align_args.output_type.unwrap_or(OutputType::Pretty);
    match output_type {
        OutputType::Pretty =>
            report::write_pretty(&mut writer, &pair, &result)?,
        OutputType::Report => {
            let tables_out = if align_args.with_tables { tables.as_ref() } else { None };
            report::write_report(&mut writer, &result, tables_out)?
        },
        OutputType::Json =>
            report::write_json(&mut writer, &pair, &result,
                               report::ModelSummary::new(aligner.model()))?,
    }

    if let Some(debug) = debug_writer {
        info!("Waiting for debug writer thread to finish...");
        debug.log(DebugOutputMessage::Terminate);
        debug.join()?;
    }

    Ok(())
}

fn gen_config_subcommand(gen_args: &GenConfigArgs) -> Result<()> {
    let matrix = generate_matrix(
        gen_args.preset.into(),
        gen_args.alphabet.as_bytes(),
        gen_args.seed,
        gen_args.gap_open,
        gen_args.gap_extend,
    );

    if let Some(parent) = gen_args.out.parent() {
        fs::create_dir_all(parent)?
    }

    let mut file = File::create(&gen_args.out)
        .map(BufWriter::new)
        .with_context(|| format!("Could not create {:?}", gen_args.out))?;
    write_score_config(&mut file, &matrix)?;

    info!("Wrote score configuration to {:?}", gen_args.out);

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    build_base_subscriber(args.verbose).init();

    match &args.command {
        Some(CliSubcommand::Align(v)) => align_subcommand(v)?,
        Some(CliSubcommand::GenConfig(v)) => gen_config_subcommand(v)?,
        None => {
            return Err(GemelliError::Other).with_context(|| "No subcommand given.".to_string())
        }
    };

    Ok(())
}
