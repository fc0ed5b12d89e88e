//! Findfiles CLI application entry point
//!
//! Parses the command line, runs the search over every target and prints the
//! selected objects sorted by time.
//!
//! # Usage
//!
//! ```bash
//! # Files below src modified within the last two days, newest last
//! findfiles -f -r -m -2D src
//!
//! # Everything named *.log that is older than a reference file, verbose
//! findfiles -fdo -v -p '\.log$' -M -marker.txt /var/log
//!
//! # Case-insensitive pattern, sizes in KiB/MiB, newest first
//! findfiles -f -i -p '^readme' -H -R -v .
//!
//! # Options apply to the targets after them: files in /tmp, directories in /var
//! findfiles -f /tmp -f -d /var
//! ```
//!
//! # Exit status
//!
//! `0` when everything was processed, `1` when some object or target could
//! not be accessed, `2` when the run was aborted.
//!
//! # Configuration
//!
//! Defaults are read from `~/.config/findfiles/config.toml` on Linux and from
//! `FINDFILES_*` environment variables.

use std::io;
use std::process::ExitCode;

use findfiles::{
    FindError,
    cli::Invocation,
    config::Settings,
    report::Reporter,
    search,
    walk::OsFileSystem,
};

type Result<T> = std::result::Result<T, FindError>;

/// Status for a run that aborted
const EXIT_FATAL: u8 = 2;

/// Install the stderr subscriber; `RUST_LOG` overrides the verbosity level.
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 | 1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// A closed stdout ends the report quietly; the run keeps its error status.
fn settle_report(written: io::Result<()>, had_errors: bool) -> Result<bool> {
    match written {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(had_errors),
        written => {
            written?;
            Ok(had_errors)
        }
    }
}

fn run(invocation: &Invocation) -> Result<bool> {
    let settings = Settings::load()?;
    let fs = OsFileSystem;
    let config = invocation.search_config(&settings, &fs)?;

    let outcome = search(&config, &fs)?;
    let had_errors = outcome.had_errors();

    let reporter = Reporter::new(config.display, config.start);
    let mut stdout = io::stdout().lock();
    settle_report(reporter.report(outcome.records, &mut stdout), had_errors)
}

fn main() -> ExitCode {
    let invocation = Invocation::parse();
    setup_logging(invocation.verbosity());

    match run(&invocation) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("findfiles: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
