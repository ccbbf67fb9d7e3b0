// this_file: src/main.rs

//! Command-line driver for `turbomin`.
//!
//! Minimal contract per the core's external-interface spec: read a
//! complete JSON document from `INPUT` (or stdin), minify it, write the
//! result to `OUTPUT` (or stdout). The core does all of the actual
//! parsing and strategy selection; this binary only wires argv/stdio to
//! it and formats diagnostics.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use turbomin_core::{Error, ProcessingMode};

/// A high-throughput JSON minifier with streaming, block, and parallel
/// execution strategies.
#[derive(Debug, Parser)]
#[command(name = "turbomin", version, about)]
struct Cli {
    /// Input file; omit or pass `-` to read from stdin.
    input: Option<PathBuf>,

    /// Output file; omit or pass `-` to write to stdout.
    output: Option<PathBuf>,

    /// Execution strategy. Defaults to automatic dispatch based on input
    /// size, available memory, and CPU features.
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Reject input the block/chunked fast paths would otherwise accept
    /// leniently (e.g. trailing commas). This is the default.
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,

    /// Accept trailing commas in the SPORT/TURBO fast paths instead of
    /// rejecting them like the byte state machine does.
    #[arg(long)]
    lenient: bool,

    /// Override the TURBO worker-count hint (defaults to the number of
    /// logical CPUs).
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Disable the SIMD fast paths regardless of what the CPU supports.
    #[arg(long)]
    no_simd: bool,

    /// Print tracing diagnostics (worker lifecycle, dispatch decisions)
    /// to stderr. Repeat for more detail, or set `RUST_LOG` directly.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// CLI-facing mirror of [`ProcessingMode`], spelled the way users type it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Eco,
    Sport,
    Turbo,
}

impl From<Mode> for ProcessingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Eco => ProcessingMode::Eco,
            Mode::Sport => ProcessingMode::Sport,
            Mode::Turbo => ProcessingMode::Turbo,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(jobs) = cli.jobs {
        // Read once by `dispatch::worker_count_hint`, before any worker
        // thread starts.
        std::env::set_var("TURBOMIN_JOBS", jobs.to_string());
    }
    if cli.no_simd {
        std::env::set_var("TURBOMIN_NO_SIMD", "1");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let input = read_input(cli.input.as_deref())?;
    let mode = cli.mode.map(ProcessingMode::from);
    // `--strict` and `--lenient` are mutually exclusive (enforced by
    // clap); strict is simply the default when neither is given.
    let strict = cli.strict || !cli.lenient;

    match turbomin_core::minify_with_options(&input, mode, strict) {
        Ok(output) => write_output(cli.output.as_deref(), &output),
        Err(err) => {
            eprintln!("{}", format_minify_error(&err, &input));
            std::process::exit(1);
        }
    }
}

fn is_stdio_marker(path: Option<&Path>) -> bool {
    path.is_none() || path == Some(Path::new("-"))
}

fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if is_stdio_marker(path) {
        io::stdin().read_to_end(&mut buf)?;
    } else {
        File::open(path.unwrap())?.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    if is_stdio_marker(path) {
        io::stdout().write_all(bytes)?;
    } else {
        File::create(path.unwrap())?.write_all(bytes)?;
    }
    Ok(())
}

fn format_error(err: &anyhow::Error) -> String {
    format!("error: {err}")
}

/// Formats a core [`Error`] as `error: <kind> at line L column C`, or
/// `error: <kind>` when the error carries no byte position (resource and
/// concurrency errors).
fn format_minify_error(err: &Error, input: &[u8]) -> String {
    match err.line_col(input) {
        Some(lc) => format!("error: {} at line {} column {}", err.kind(), lc.line, lc.column),
        None => format!("error: {}", err.kind()),
    }
}

fn init_tracing(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_marker_recognizes_dash_and_none() {
        assert!(is_stdio_marker(None));
        assert!(is_stdio_marker(Some(Path::new("-"))));
        assert!(!is_stdio_marker(Some(Path::new("file.json"))));
    }

    #[test]
    fn formats_minify_error_with_line_and_column() {
        let input = b"{\n  \"a\": ,\n}";
        let err = turbomin_core::minify(input).unwrap_err();
        let msg = format_minify_error(&err, input);
        assert!(msg.starts_with("error: InvalidJson at line 2 column"));
    }

    #[test]
    fn mode_conversion_round_trips() {
        assert_eq!(ProcessingMode::from(Mode::Eco), ProcessingMode::Eco);
        assert_eq!(ProcessingMode::from(Mode::Sport), ProcessingMode::Sport);
        assert_eq!(ProcessingMode::from(Mode::Turbo), ProcessingMode::Turbo);
    }
}
