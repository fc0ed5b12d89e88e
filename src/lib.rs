//! Findfiles - find filesystem objects by name and time, sorted by time
//!
//! This library walks command-line targets, selects objects by kind, name
//! pattern and access or modification time, and reports them ordered by
//! that time with nanosecond precision.
//!
//! # Flow
//!
//! For each target the [`walk::Traverser`] visits every object once, the
//! [`select::Selector`] decides whether it is recorded, and accepted objects
//! are appended to a [`collect::Collector`]. Once every target is done the
//! [`report::Reporter`] sorts and prints the records.

use thiserror::Error;

pub mod cli;
pub mod collect;
pub mod config;
pub mod patterns;
pub mod report;
pub mod select;
pub mod time;
pub mod walk;

#[cfg(test)]
pub mod testing;

use collect::{CollectError, Collector, ObjectRecord};
use config::SearchConfig;
use walk::{FileSystem, Traverser, Visit, WalkOptions, WalkStats};

/// Error enum, contains all fatal failure states of the program
///
/// Problems with individual objects are not errors at this level; they are
/// logged and counted in [`SearchOutcome`].
#[derive(Debug, Error)]
pub enum FindError {
    /// Malformed age, timestamp or reference object
    #[error("Invalid time criterion: {0}")]
    Time(#[from] time::TimeError),
    /// Invalid or too many name patterns
    #[error("Pattern error: {0}")]
    Pattern(#[from] patterns::PatternError),
    /// The result table could not grow
    #[error("Out of memory: {0}")]
    Collect(#[from] CollectError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Records selected by a search and what went wrong along the way
#[derive(Debug)]
pub struct SearchOutcome {
    /// Accepted objects in visiting order
    pub records: Vec<ObjectRecord>,
    pub stats: WalkStats,
}

impl SearchOutcome {
    /// Whether any object or target could not be processed
    #[must_use]
    pub const fn had_errors(&self) -> bool {
        self.stats.errors > 0
    }
}

/// Run a search over every target of `config`.
///
/// Each target is walked and filtered with its own options. A target that
/// is selected by no object kind is skipped with a warning and counts as an
/// error.
///
/// # Errors
///
/// Returns `FindError::Collect` if the result table cannot grow. Everything
/// else that fails is logged, counted and skipped.
pub fn search<F: FileSystem>(config: &SearchConfig, fs: &F) -> Result<SearchOutcome, FindError> {
    let mut collector = Collector::new();
    let mut traverser = Traverser::new(fs, WalkOptions::default());

    for scoped in &config.targets {
        let target = scoped.target.as_str();
        let selector = scoped.selector();
        if !selector.types().any() {
            tracing::warn!("No output target types requested for '{target}'!");
            traverser.record_error();
            continue;
        }

        traverser.set_options(scoped.walk);
        let visited_before = traverser.stats().visited;
        let accepted_before = collector.len();
        traverser.walk(target, &mut |visit: Visit<'_>| -> Result<(), CollectError> {
            if selector.accepts(visit.path, visit.kind, visit.meta) {
                collector.append(ObjectRecord::new(
                    visit.path.to_path_buf(),
                    selector.relevant_time(visit.meta),
                    visit.meta.size,
                ))?;
            }
            Ok(())
        })?;
        tracing::info!(
            "'{target}': {} objects visited, {} selected",
            traverser.stats().visited - visited_before,
            collector.len() - accepted_before
        );
    }

    Ok(SearchOutcome {
        records: collector.into_records(),
        stats: traverser.stats(),
    })
}
