use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use graynorm::{read_file, GrayNorm, GrayNormConfig, GrayNormError, DEFAULT_COMBINATORIAL_LIMIT};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ranks combinations of candidate RT-qPCR reference genes by how little the
/// experimental conditions disturb their normalization factor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file to read input from
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// CSV file to write the results to
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,

    /// Candidate genes overriding the header: names, 1-based column numbers or ranges (e.g. 4-7)
    #[arg(long, value_name = "SPEC")]
    refgenes: Option<String>,

    /// Only score combinations of at most this many genes
    #[arg(long = "max-size", value_name = "K")]
    max_size: Option<usize>,

    /// Reject candidate panels larger than this
    #[arg(long, value_name = "N", default_value_t = DEFAULT_COMBINATORIAL_LIMIT)]
    limit: usize,

    /// Number of worker threads used for scoring
    #[arg(short, long)]
    threads: Option<usize>,

    /// Score combinations on a single thread
    #[arg(long)]
    sequential: bool,

    /// Also print the ranking to stdout
    #[arg(long)]
    print: bool,

    /// Print feedback during the run
    #[arg(short, long)]
    verbose: bool,
}
impl Cli {
    fn config(&self) -> GrayNormConfig {
        GrayNormConfig::builder()
            .maybe_max_combination_size(self.max_size)
            .combinatorial_limit(self.limit)
            .parallel(!self.sequential)
            .maybe_threads(self.threads)
            .build()
    }
}

/// Rewrites the single-dash long flags of the original GrayNorm script
fn normalize_legacy_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| match arg.as_str() {
            "-in" | "-out" | "-refgenes" | "-verbose" => format!("-{arg}"),
            _ => arg,
        })
        .collect()
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let dataset = read_file(&cli.input, cli.refgenes.as_deref())
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let results = GrayNorm::new(&dataset, cli.config()).run()?;
    if cli.print {
        results.pprint();
    }

    results
        .write_path(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(
        rows = results.len(),
        path = %cli.output.display(),
        "wrote ranking"
    );
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<GrayNormError>()
        .map(GrayNormError::exit_code)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_legacy_args(std::env::args()));
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
