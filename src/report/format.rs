//! Field formatting for verbose output lines

use std::fmt::Display;

use byte_unit::{Byte, UnitType};
use chrono::TimeZone;

use crate::time::TimeValue;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86_400;

/// strftime layout of the time column
pub const TIME_COLUMN_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Scaling base for human-readable sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeScale {
    /// Powers of 1024 (KiB, MiB, ...)
    Binary,
    /// Powers of 1000 (KB, MB, ...)
    Decimal,
}

impl SizeScale {
    /// Map a numeric base (`1000` or `1024`) to a scale
    #[must_use]
    pub const fn from_base(base: u32) -> Option<Self> {
        match base {
            1024 => Some(Self::Binary),
            1000 => Some(Self::Decimal),
            _ => None,
        }
    }

    const fn unit_type(self) -> UnitType {
        match self {
            Self::Binary => UnitType::Binary,
            Self::Decimal => UnitType::Decimal,
        }
    }
}

/// Format the local-time column, e.g. `20240131_235959`.
///
/// Falls back to the raw `seconds.nanoseconds` value for instants the time
/// zone cannot represent.
#[must_use]
pub fn format_timestamp<Tz>(time: &TimeValue, nanoseconds: bool, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(dt) = tz.timestamp_opt(time.secs(), time.nanos()).single() else {
        return time.to_string();
    };
    let mut out = dt.format(TIME_COLUMN_FORMAT).to_string();
    if nanoseconds {
        out.push_str(&format!(".{:09}", time.nanos()));
    }
    out
}

/// Format the age column: the time elapsed from `time` to `start`.
///
/// Objects newer than the start time get a `-` immediately before the first
/// digit.
#[must_use]
pub fn format_age(start: &TimeValue, time: &TimeValue, seconds_only: bool, nanoseconds: bool, units: bool) -> String {
    let (age, negative) = TimeValue::difference(start, time);
    let sign = if negative { "-" } else { "" };
    let fraction = if nanoseconds {
        format!(".{:09}", age.nanos())
    } else {
        String::new()
    };

    if seconds_only {
        let unit = if units { "s" } else { "" };
        let value = format!("{sign}{}{fraction}", age.secs());
        let width = if nanoseconds { 25 } else { 15 };
        return format!(" {value:>width$}{unit} ");
    }

    let total = age.secs();
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;
    let days = format!("{sign}{days}");
    format!(" {days:>6}D_{hours:02}:{minutes:02}:{seconds:02}{fraction} ")
}

/// Format the size column, raw or scaled.
#[must_use]
pub fn format_size(size: u64, human: Option<SizeScale>, units: bool) -> String {
    match human {
        Some(scale) => {
            let scaled = Byte::from_u64(size).get_appropriate_unit(scale.unit_type());
            format!(" {:>14}  ", format!("{scaled:.1}"))
        }
        None => {
            let unit = if units { "B" } else { "" };
            format!(" {size:>14}{unit}  ")
        }
    }
}
