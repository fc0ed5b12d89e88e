//! Sorting and printing of collected records
//!
//! Records are ordered by time, then by path using a plain byte-wise
//! comparison. The reverse flag inverts every level of that key, so paths
//! with identical times come out in descending order too.
//!
//! # Output layout
//!
//! At verbosity 0 only the path is printed. Above that each line reads
//! `<time> <age> <size>  <path>`:
//!
//! ```text
//! 20240131_235958      2D_03:04:05            1234  dir/a.txt
//! ```

pub mod format;

pub use format::{SizeScale, format_age, format_size, format_timestamp};

use std::cmp::Ordering;
use std::fmt::Display;
use std::io::{self, Write};

use chrono::TimeZone;

use crate::collect::ObjectRecord;
use crate::time::TimeValue;

/// How records are ordered and which columns are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    pub verbosity: u8,
    pub reverse: bool,
    pub seconds_only: bool,
    pub nanoseconds: bool,
    pub units: bool,
    pub human: Option<SizeScale>,
}

/// Order two records by time, then path.
#[must_use]
pub fn compare_records(a: &ObjectRecord, b: &ObjectRecord, reverse: bool) -> Ordering {
    let ordering = TimeValue::compare(&a.time, &b.time).then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()));
    if reverse { ordering.reverse() } else { ordering }
}

/// Sorts records and renders them relative to the run's start time
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    options: DisplayOptions,
    start: TimeValue,
}

impl Reporter {
    #[must_use]
    pub const fn new(options: DisplayOptions, start: TimeValue) -> Self {
        Self { options, start }
    }

    #[must_use]
    pub const fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn sort(&self, records: &mut [ObjectRecord]) {
        let reverse = self.options.reverse;
        records.sort_by(|a, b| compare_records(a, b, reverse));
    }

    /// Render one output line, without the trailing newline.
    #[must_use]
    pub fn format_record<Tz>(&self, record: &ObjectRecord, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let name = record.path.to_string_lossy();
        if self.options.verbosity == 0 {
            return name.into_owned();
        }
        let opts = &self.options;
        format!(
            "{}{}{}{name}",
            format_timestamp(&record.time, opts.nanoseconds, tz),
            format_age(&self.start, &record.time, opts.seconds_only, opts.nanoseconds, opts.units),
            format_size(record.size, opts.human, opts.units),
        )
    }

    /// Write already sorted records, one per line, in the given time zone.
    ///
    /// # Errors
    /// Returns the I/O error from `out`.
    pub fn write_records_in<W, Tz>(&self, records: &[ObjectRecord], out: &mut W, tz: &Tz) -> io::Result<()>
    where
        W: Write,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        for record in records {
            writeln!(out, "{}", self.format_record(record, tz))?;
        }
        out.flush()
    }

    /// Sort the records and write them in local time.
    ///
    /// # Errors
    /// Returns the I/O error from `out`.
    pub fn report<W: Write>(&self, mut records: Vec<ObjectRecord>, out: &mut W) -> io::Result<()> {
        self.sort(&mut records);
        self.write_records_in(&records, out, &chrono::Local)
    }
}
