//! Command-line interface definitions and parsing
//!
//! This module defines the findfiles command line using the `clap` crate and
//! turns a parsed invocation into a [`SearchConfig`].
//!
//! # Ordering
//!
//! Options apply to the targets that follow them, so the derive struct alone
//! is not enough. Positions are read back from the [`ArgMatches`] and the
//! options and targets are replayed left to right:
//!
//! - `-d`, `-f`, `-o`, `-r`, `-L` and `-i` flip their setting on every
//!   occurrence. `-i` only affects the pattern options after it.
//! - `-p`/`-x` start a new pattern chain, `-P`/`-X` extend the current one.
//! - Every time criterion (`-a`, `-m`, `-A`, `-M`) is decoded where it
//!   appears; a target uses the last one before it.
//! - A target is searched with the settings in effect at its position.
//!
//! Display options (`-v`, `-R`, `-s`, `-n`, `-u`, `-H`) apply to the whole
//! report wherever they appear.
//!
//! # Examples
//!
//! ```no_run
//! use findfiles::cli::Invocation;
//! use findfiles::config::Settings;
//! use findfiles::walk::OsFileSystem;
//!
//! let invocation = Invocation::parse();
//! let settings = Settings::load().unwrap_or_default();
//! let config = invocation.search_config(&settings, &OsFileSystem).unwrap();
//! ```

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::FindError;
use crate::config::{SearchConfig, Settings, TargetSearch};
use crate::patterns::{PatternChain, PatternOp, Polarity};
use crate::report::{DisplayOptions, SizeScale};
use crate::time::{TimeField, TimeSelector, TimeValue};
use crate::walk::FileSystem;

const AFTER_HELP: &str = "\
Options are read left to right and apply to the targets after them:
  findfiles -f -m -3h / /tmp -f -d -a 1h /var
lists files modified within 3 hours below / and /tmp, then directories last
accessed at least an hour ago below /var. -d, -f, -o, -r, -L and -i toggle.

Time units: s (seconds), m (minutes), h (hours), D (days), W (weeks),
            M (months), Y (years)

A leading '-' on an age selects objects at most that old, anything else
selects objects at least that old. On a timestamp or reference object a
leading '-' selects older objects, anything else newer ones. Reference
object comparisons are strict; age and timestamp comparisons are not.";

#[derive(Parser, Debug)]
#[command(name = "findfiles")]
#[command(about = "Find files by name pattern and access or modification time, sorted by time", long_about = None)]
#[command(version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Toggle reporting of directories
    #[arg(short = 'd', long = "directories", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub directories: Vec<bool>,

    /// Toggle reporting of regular files
    #[arg(short = 'f', long = "files", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub files: Vec<bool>,

    /// Toggle reporting of other objects (links, fifos, sockets, devices)
    #[arg(short = 'o', long = "others", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub others: Vec<bool>,

    /// Toggle descending into subdirectories
    #[arg(short = 'r', long = "recursive", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub recursive: Vec<bool>,

    /// Toggle following symbolic links (starts from the config value)
    #[arg(short = 'L', long = "follow-symlinks", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_symlinks: Vec<bool>,

    /// Do not descend below this depth
    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Vec<usize>,

    /// Toggle case-insensitive matching for the patterns that follow
    #[arg(short = 'i', long = "ignore-case", action = ArgAction::Append, num_args = 0,
          default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub ignore_case: Vec<bool>,

    /// Start a new pattern chain with a name that must match
    #[arg(short = 'p', long = "pattern", value_name = "ERE", allow_hyphen_values = true)]
    pub pattern: Vec<String>,

    /// Add a name pattern that must also match
    #[arg(short = 'P', long = "and-pattern", value_name = "ERE", allow_hyphen_values = true)]
    pub and_pattern: Vec<String>,

    /// Start a new pattern chain with a name that must not match
    #[arg(short = 'x', long = "exclude", value_name = "ERE", allow_hyphen_values = true)]
    pub exclude: Vec<String>,

    /// Add a name pattern that must also not match
    #[arg(short = 'X', long = "and-exclude", value_name = "ERE", allow_hyphen_values = true)]
    pub and_exclude: Vec<String>,

    /// Select by last access age or timestamp
    #[arg(short = 'a', long = "acc-age", value_name = "AGE", allow_hyphen_values = true)]
    pub acc_age: Vec<String>,

    /// Select by last modification age or timestamp
    #[arg(short = 'm', long = "mod-age", value_name = "AGE", allow_hyphen_values = true)]
    pub mod_age: Vec<String>,

    /// Select by the last access time of another object
    #[arg(short = 'A', long = "acc-ref", value_name = "PATH", allow_hyphen_values = true)]
    pub acc_ref: Vec<String>,

    /// Select by the last modification time of another object
    #[arg(short = 'M', long = "mod-ref", value_name = "PATH", allow_hyphen_values = true)]
    pub mod_ref: Vec<String>,

    /// Print time, age and size columns (repeat for more diagnostics)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Reverse the sort order
    #[arg(short = 'R', long = "reverse", overrides_with = "reverse")]
    pub reverse: bool,

    /// Print ages in seconds
    #[arg(short = 's', long = "seconds", overrides_with = "seconds")]
    pub seconds: bool,

    /// Print nanoseconds in times and ages
    #[arg(short = 'n', long = "nanoseconds", overrides_with = "nanoseconds")]
    pub nanoseconds: bool,

    /// Print units: s for seconds, B for bytes
    #[arg(short = 'u', long = "units", overrides_with = "units")]
    pub units: bool,

    /// Print human-readable sizes scaled by 1000 or 1024 (overrides config)
    #[arg(
        short = 'H',
        long = "human",
        value_name = "BASE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1024",
        value_parser = parse_base,
        overrides_with = "human",
    )]
    pub human: Option<u32>,

    /// Measure ages from this instant instead of the current time
    #[arg(long = "now", value_name = "SECONDS[.FRACTION]", hide = true, allow_hyphen_values = true, value_parser = parse_start)]
    pub now: Option<TimeValue>,

    /// Files or directories to search
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,
}

fn parse_base(value: &str) -> Result<u32, String> {
    match value {
        "1000" => Ok(1000),
        "1024" => Ok(1024),
        _ => Err(format!("'{value}' is not 1000 or 1024")),
    }
}

/// Parse `SECONDS[.FRACTION]` since the epoch, optionally negative.
fn parse_start(value: &str) -> Result<TimeValue, String> {
    let invalid = || format!("'{value}' is not SECONDS[.FRACTION]");
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty()
        || fraction.len() > 9
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    let secs: i64 = whole.parse().map_err(|_| invalid())?;
    let nanos: i64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().map_err(|_| invalid())?
    };
    Ok(if negative {
        TimeValue::normalize(-secs, -nanos)
    } else {
        TimeValue::normalize(secs, nanos)
    })
}

/// A setting flipped by every occurrence of its flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Directories,
    Files,
    Others,
    Recursive,
    FollowSymlinks,
    IgnoreCase,
}

/// An ordering-sensitive option or a target, replayed in command-line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderedOption {
    Toggle(Toggle),
    Pattern(PatternOp),
    Age { field: TimeField, expr: String },
    Reference { field: TimeField, path: String },
    MaxDepth(usize),
    Target(String),
}

/// Values of one option paired with their command-line positions
fn indexed_values<'a, T>(matches: &'a ArgMatches, id: &str) -> Vec<(usize, &'a T)>
where
    T: Clone + Send + Sync + 'static,
{
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices.zip(values).collect(),
        _ => Vec::new(),
    }
}

/// Rebuild the left-to-right sequence of options and targets.
fn ordered_options(matches: &ArgMatches) -> Vec<OrderedOption> {
    let mut options: Vec<(usize, OrderedOption)> = Vec::new();

    let toggles = [
        ("directories", Toggle::Directories),
        ("files", Toggle::Files),
        ("others", Toggle::Others),
        ("recursive", Toggle::Recursive),
        ("follow_symlinks", Toggle::FollowSymlinks),
        ("ignore_case", Toggle::IgnoreCase),
    ];
    for (id, toggle) in toggles {
        if let Some(indices) = matches.indices_of(id) {
            options.extend(indices.map(|i| (i, OrderedOption::Toggle(toggle))));
        }
    }

    let patterns = [
        ("pattern", Polarity::Include, true),
        ("and_pattern", Polarity::Include, false),
        ("exclude", Polarity::Exclude, true),
        ("and_exclude", Polarity::Exclude, false),
    ];
    for (id, polarity, initialize) in patterns {
        for (i, value) in indexed_values::<String>(matches, id) {
            let pattern = value.clone();
            let op = if initialize {
                PatternOp::Initialize { pattern, polarity }
            } else {
                PatternOp::Extend { pattern, polarity }
            };
            options.push((i, OrderedOption::Pattern(op)));
        }
    }

    for (id, field) in [("acc_age", TimeField::Access), ("mod_age", TimeField::Modification)] {
        for (i, value) in indexed_values::<String>(matches, id) {
            options.push((i, OrderedOption::Age { field, expr: value.clone() }));
        }
    }
    for (id, field) in [("acc_ref", TimeField::Access), ("mod_ref", TimeField::Modification)] {
        for (i, value) in indexed_values::<String>(matches, id) {
            options.push((i, OrderedOption::Reference { field, path: value.clone() }));
        }
    }

    for (i, depth) in indexed_values::<usize>(matches, "max_depth") {
        options.push((i, OrderedOption::MaxDepth(*depth)));
    }
    for (i, target) in indexed_values::<String>(matches, "targets") {
        options.push((i, OrderedOption::Target(target.clone())));
    }

    options.sort_by_key(|(i, _)| *i);
    options.into_iter().map(|(_, option)| option).collect()
}

/// Settings in effect at one point of the command line
#[derive(Debug, Clone)]
struct ReplayState {
    search: TargetSearch,
    ignore_case: bool,
}

impl ReplayState {
    fn new(settings: &Settings) -> Self {
        let mut search = TargetSearch::new(String::new());
        search.chain = PatternChain::new(settings.max_patterns);
        search.walk.follow_symlinks = settings.follow_symlinks;
        Self {
            search,
            ignore_case: false,
        }
    }

    fn toggle(&mut self, toggle: Toggle) {
        let setting = match toggle {
            Toggle::Directories => &mut self.search.types.directories,
            Toggle::Files => &mut self.search.types.files,
            Toggle::Others => &mut self.search.types.others,
            Toggle::Recursive => &mut self.search.walk.recursive,
            Toggle::FollowSymlinks => &mut self.search.walk.follow_symlinks,
            Toggle::IgnoreCase => &mut self.ignore_case,
        };
        *setting = !*setting;
    }

    fn target(&self, target: &str) -> TargetSearch {
        TargetSearch {
            target: target.to_string(),
            ..self.search.clone()
        }
    }
}

/// A parsed command line with its ordering-sensitive options
#[derive(Debug)]
pub struct Invocation {
    cli: Cli,
    ordered: Vec<OrderedOption>,
}

impl Invocation {
    /// Parse the process arguments, exiting with usage on error
    #[must_use]
    pub fn parse() -> Self {
        let matches = Cli::command().get_matches();
        match Self::from_matches(&matches) {
            Ok(invocation) => invocation,
            Err(e) => e.exit(),
        }
    }

    /// Parse an explicit argument list
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid or missing arguments.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Cli::command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let cli = Cli::from_arg_matches(matches)?;
        let ordered = ordered_options(matches);
        Ok(Self { cli, ordered })
    }

    #[must_use]
    pub const fn cli(&self) -> &Cli {
        &self.cli
    }

    #[must_use]
    pub fn ordered(&self) -> &[OrderedOption] {
        &self.ordered
    }

    #[must_use]
    pub const fn verbosity(&self) -> u8 {
        self.cli.verbose
    }

    /// Resolve the invocation into the record the search runs on
    ///
    /// The start time is fixed first, so every relative criterion is
    /// measured from the same instant. Options are then replayed in order
    /// and each target takes a snapshot of the settings at its position.
    ///
    /// # Errors
    ///
    /// Returns `FindError` for an invalid pattern, too many pattern rules, an
    /// undecodable time criterion or an unreadable reference object.
    pub fn search_config<F: FileSystem>(&self, settings: &Settings, fs: &F) -> Result<SearchConfig, FindError> {
        let cli = &self.cli;
        let start = cli.now.unwrap_or_else(TimeValue::now);
        let time_selector = TimeSelector::new(start, settings.timestamp_format.clone());

        let mut state = ReplayState::new(settings);
        let mut targets = Vec::with_capacity(cli.targets.len());
        for option in &self.ordered {
            match option {
                OrderedOption::Toggle(toggle) => state.toggle(*toggle),
                OrderedOption::Pattern(op) => state.search.chain.apply(op, state.ignore_case)?,
                OrderedOption::Age { field, expr } => {
                    state.search.criterion = Some(time_selector.parse(expr, *field)?);
                }
                OrderedOption::Reference { field, path } => {
                    state.search.criterion = Some(time_selector.reference(path, *field, fs)?);
                }
                OrderedOption::MaxDepth(depth) => state.search.walk.max_depth = Some(*depth),
                OrderedOption::Target(target) => targets.push(state.target(target)),
            }
        }

        let human = match cli.human {
            Some(base) => Some(
                SizeScale::from_base(base)
                    .ok_or_else(|| FindError::InvalidInput(format!("Unsupported size base {base}")))?,
            ),
            None => settings.size_scale(),
        };

        Ok(SearchConfig {
            targets,
            display: DisplayOptions {
                verbosity: cli.verbose,
                reverse: cli.reverse,
                seconds_only: cli.seconds,
                nanoseconds: cli.nanoseconds,
                units: cli.units,
                human,
            },
            start,
        })
    }
}
