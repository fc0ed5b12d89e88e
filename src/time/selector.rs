//! Decoding of time criteria
//!
//! A criterion expression takes one of three forms:
//!
//! - **Relative age** `[±]<number><unit>`: the target is the start time minus
//!   the age. `-` selects objects newer than or equal to the target, anything
//!   else selects objects older than or equal to it.
//! - **Absolute timestamp** in the configured template (default
//!   `YYYYMMDD_HHMMSS`) with an optional `.fraction`. `-` selects objects
//!   older than or equal to the timestamp, `+` or no sign selects newer.
//! - **Reference object**: the access or modification time of another object.
//!   `-` selects strictly older, `+` or no sign selects strictly newer. The
//!   strictness is encoded by shifting the target one nanosecond away from the
//!   reference, so every criterion compares inclusively.
//!
//! Month and year ages use calendar arithmetic; all other units are fixed
//! lengths and may be fractional.

use chrono::{DateTime, LocalResult, Months, NaiveDateTime, Offset, TimeDelta, TimeZone};

use super::error::TimeError;
use super::value::{NANOS_PER_SEC, TimeValue};
use crate::walk::FileSystem;

/// Default strftime template for absolute timestamps
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Maximum number of fractional digits honoured; further digits are ignored
const MAX_FRACTION_DIGITS: usize = 9;

const SECONDS_PER_MINUTE: i128 = 60;
const SECONDS_PER_HOUR: i128 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i128 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i128 = 7 * SECONDS_PER_DAY;

/// Which timestamp of an object a criterion looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeField {
    /// Last access time
    Access,
    /// Last modification time
    #[default]
    Modification,
}

/// Which side of the target time is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Object time is at or after the target
    NewerOrEqual,
    /// Object time is at or before the target
    OlderOrEqual,
}

/// A decoded time criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriterion {
    pub field: TimeField,
    pub target: TimeValue,
    pub direction: Direction,
}

impl SelectionCriterion {
    #[must_use]
    pub const fn new(field: TimeField, target: TimeValue, direction: Direction) -> Self {
        Self {
            field,
            target,
            direction,
        }
    }

    #[must_use]
    pub const fn use_access_time(&self) -> bool {
        matches!(self.field, TimeField::Access)
    }

    /// Check an object's relevant time against the target.
    #[must_use]
    pub fn accepts(&self, time: &TimeValue) -> bool {
        match self.direction {
            Direction::NewerOrEqual => *time >= self.target,
            Direction::OlderOrEqual => *time <= self.target,
        }
    }
}

/// Unit of a relative age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeUnit {
    Fixed(i128),
    Months(u32),
}

impl AgeUnit {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Fixed(1)),
            'm' => Some(Self::Fixed(SECONDS_PER_MINUTE)),
            'h' => Some(Self::Fixed(SECONDS_PER_HOUR)),
            'D' => Some(Self::Fixed(SECONDS_PER_DAY)),
            'W' => Some(Self::Fixed(SECONDS_PER_WEEK)),
            'M' => Some(Self::Months(1)),
            'Y' => Some(Self::Months(12)),
            _ => None,
        }
    }
}

/// A non-negative decimal split into its integer part and its fraction in
/// nanoseconds, without going through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decimal {
    whole: u64,
    frac_nanos: i64,
}

impl Decimal {
    fn parse(text: &str, input: &str) -> Result<Self, TimeError> {
        let (whole_str, frac_str) = text.split_once('.').unwrap_or((text, ""));
        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(TimeError::invalid_age(input, "missing number"));
        }
        if !whole_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(TimeError::invalid_age(input, "not a decimal number"));
        }
        let whole = if whole_str.is_empty() {
            0
        } else {
            whole_str
                .parse::<u64>()
                .map_err(|_| TimeError::out_of_range(input))?
        };
        Ok(Self {
            whole,
            frac_nanos: fraction_to_nanos(frac_str),
        })
    }

    const fn is_integral(&self) -> bool {
        self.frac_nanos == 0
    }
}

/// Convert the digits after a decimal point into nanoseconds.
fn fraction_to_nanos(digits: &str) -> i64 {
    let mut nanos: i64 = 0;
    let mut scale = NANOS_PER_SEC;
    for c in digits.chars().take(MAX_FRACTION_DIGITS) {
        scale /= 10;
        nanos += i64::from(c.to_digit(10).unwrap_or(0)) * scale;
    }
    nanos
}

/// Split a leading `+` or `-` from an expression.
fn split_sign(expr: &str) -> (Option<char>, &str) {
    match expr.chars().next() {
        Some(c @ ('+' | '-')) => (Some(c), &expr[1..]),
        _ => (None, expr),
    }
}

/// Whether the body looks like `<number><letter>`
fn is_relative_shape(body: &str) -> bool {
    let mut chars = body.chars();
    match chars.next_back() {
        Some(unit) if unit.is_ascii_alphabetic() => {
            let number = chars.as_str();
            !number.is_empty() && number.chars().all(|c| c.is_ascii_digit() || c == '.')
        }
        _ => false,
    }
}

/// Render a strftime template the way users type it
#[must_use]
pub fn template_display(format: &str) -> String {
    format
        .replace("%Y", "YYYY")
        .replace("%m", "MM")
        .replace("%d", "DD")
        .replace("%H", "HH")
        .replace("%M", "MM")
        .replace("%S", "SS")
}

/// Subtract whole calendar months from an instant in the given time zone.
///
/// Days past the end of the resulting month clamp to its last day, so one
/// month before March 31 is the last day of February. The shifted wall-clock
/// time always resolves: a repeated hour takes its earlier instant, and a
/// time skipped by a forward transition is read with the offset in effect
/// before it, which lands past the gap.
pub fn subtract_months<Tz: TimeZone>(start: &TimeValue, months: u32, tz: &Tz) -> Option<TimeValue> {
    let local: DateTime<Tz> = tz.timestamp_opt(start.secs(), start.nanos()).earliest()?;
    let shifted = local.naive_local().checked_sub_months(Months::new(months))?;
    let (secs, nanos) = match tz.from_local_datetime(&shifted) {
        LocalResult::Single(resolved) | LocalResult::Ambiguous(resolved, _) => {
            (resolved.timestamp(), resolved.timestamp_subsec_nanos())
        }
        LocalResult::None => {
            let before = shifted.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = shifted.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
            (utc.and_utc().timestamp(), utc.and_utc().timestamp_subsec_nanos())
        }
    };
    Some(TimeValue::normalize(secs, i64::from(nanos)))
}

/// Parse an absolute timestamp in the given time zone.
///
/// # Errors
/// Returns `TimeError::InvalidTimestamp` if `body` does not match `format`
/// or names a local time that does not exist.
pub fn parse_timestamp_in<Tz: TimeZone>(body: &str, format: &str, tz: &Tz) -> Result<TimeValue, TimeError> {
    let invalid = || TimeError::InvalidTimestamp {
        input: body.to_string(),
        template: template_display(format),
    };

    let (main, frac_nanos) = match body.rsplit_once('.') {
        Some((main, frac)) if !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit()) => {
            (main, fraction_to_nanos(frac))
        }
        _ => (body, 0),
    };

    let naive = NaiveDateTime::parse_from_str(main, format).map_err(|_| invalid())?;
    let resolved = tz.from_local_datetime(&naive).earliest().ok_or_else(invalid)?;
    Ok(TimeValue::normalize(resolved.timestamp(), frac_nanos))
}

/// Builds [`SelectionCriterion`] values relative to a fixed start time
#[derive(Debug, Clone)]
pub struct TimeSelector {
    start: TimeValue,
    timestamp_format: String,
}

impl TimeSelector {
    #[must_use]
    pub fn new(start: TimeValue, timestamp_format: impl Into<String>) -> Self {
        Self {
            start,
            timestamp_format: timestamp_format.into(),
        }
    }

    #[must_use]
    pub const fn start(&self) -> TimeValue {
        self.start
    }

    /// Decode an age or timestamp expression.
    ///
    /// Expressions shaped like `<number><letter>` are relative ages; anything
    /// else is tried as an absolute timestamp.
    ///
    /// # Errors
    /// Returns a `TimeError` if the expression cannot be decoded.
    pub fn parse(&self, expr: &str, field: TimeField) -> Result<SelectionCriterion, TimeError> {
        let (_, body) = split_sign(expr);
        if is_relative_shape(body) {
            self.relative(expr, field)
        } else {
            self.absolute(expr, field)
        }
    }

    /// Decode a relative age such as `3D`, `-1.5h` or `+2M`.
    ///
    /// # Errors
    /// * Returns `TimeError::InvalidUnit` for an unknown unit character.
    /// * Returns `TimeError::InvalidAge` if the number is malformed.
    /// * Returns `TimeError::OutOfRange` if the target cannot be represented.
    pub fn relative(&self, expr: &str, field: TimeField) -> Result<SelectionCriterion, TimeError> {
        let (sign, body) = split_sign(expr);
        let direction = if sign == Some('-') {
            Direction::NewerOrEqual
        } else {
            Direction::OlderOrEqual
        };

        let mut chars = body.chars();
        let unit_char = chars
            .next_back()
            .ok_or_else(|| TimeError::invalid_age(expr, "empty age"))?;
        let unit = AgeUnit::from_char(unit_char).ok_or_else(|| TimeError::InvalidUnit {
            input: expr.to_string(),
            unit: unit_char,
        })?;
        let amount = Decimal::parse(chars.as_str(), expr)?;

        let target = match unit {
            AgeUnit::Fixed(unit_secs) => {
                let total_nanos = i128::from(amount.whole) * unit_secs * i128::from(NANOS_PER_SEC)
                    + i128::from(amount.frac_nanos) * unit_secs;
                let secs = i64::try_from(total_nanos / i128::from(NANOS_PER_SEC))
                    .map_err(|_| TimeError::out_of_range(expr))?;
                // remainder is below one second
                let nanos = (total_nanos % i128::from(NANOS_PER_SEC)) as i64;
                self.start
                    .checked_sub(&TimeValue::normalize(secs, nanos))
                    .ok_or_else(|| TimeError::out_of_range(expr))?
            }
            AgeUnit::Months(per_unit) => {
                if !amount.is_integral() {
                    tracing::warn!(
                        "non-integral month/year age '{expr}' truncated to {}{unit_char}",
                        amount.whole
                    );
                }
                let months = u32::try_from(amount.whole)
                    .ok()
                    .and_then(|n| n.checked_mul(per_unit))
                    .ok_or_else(|| TimeError::out_of_range(expr))?;
                subtract_months(&self.start, months, &chrono::Local)
                    .ok_or_else(|| TimeError::out_of_range(expr))?
            }
        };

        Ok(SelectionCriterion::new(field, target, direction))
    }

    /// Decode an absolute timestamp such as `20240101_120000.5`.
    ///
    /// # Errors
    /// Returns `TimeError::InvalidTimestamp` naming the expected template.
    pub fn absolute(&self, expr: &str, field: TimeField) -> Result<SelectionCriterion, TimeError> {
        let (sign, body) = split_sign(expr);
        let direction = if sign == Some('-') {
            Direction::OlderOrEqual
        } else {
            Direction::NewerOrEqual
        };
        let target = parse_timestamp_in(body, &self.timestamp_format, &chrono::Local)?;
        Ok(SelectionCriterion::new(field, target, direction))
    }

    /// Use another object's time as a strict boundary.
    ///
    /// # Errors
    /// Returns `TimeError::ReferenceUnavailable` if the object cannot be examined.
    pub fn reference<F: FileSystem>(
        &self,
        expr: &str,
        field: TimeField,
        fs: &F,
    ) -> Result<SelectionCriterion, TimeError> {
        let (sign, path) = split_sign(expr);
        if path.is_empty() {
            return Err(TimeError::ReferenceUnavailable {
                path: expr.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty path"),
            });
        }
        let meta = fs
            .symlink_metadata(std::path::Path::new(path))
            .map_err(|source| TimeError::ReferenceUnavailable {
                path: path.to_string(),
                source,
            })?;
        let time = meta.time(field);
        let criterion = if sign == Some('-') {
            SelectionCriterion::new(field, time.offset_nanos(-1), Direction::OlderOrEqual)
        } else {
            SelectionCriterion::new(field, time.offset_nanos(1), Direction::NewerOrEqual)
        };
        Ok(criterion)
    }
}
