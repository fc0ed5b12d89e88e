//! Time-selection error types
//!
//! Every variant here is fatal: a criterion that cannot be decoded aborts the
//! whole run before any target is walked.

use thiserror::Error;

/// Errors produced while decoding a time criterion
#[derive(Debug, Error)]
pub enum TimeError {
    /// Relative age does not have the `[±]<number><unit>` shape
    #[error("Invalid relative age '{input}': {reason}")]
    InvalidAge { input: String, reason: String },

    /// Relative age ends in a character that is not a time unit
    #[error("Illegal time unit '{unit}' in '{input}' (expected one of s, m, h, D, W, M, Y)")]
    InvalidUnit { input: String, unit: char },

    /// Absolute timestamp does not match the configured template
    #[error("Invalid timestamp '{input}': expected {template}[.fraction]")]
    InvalidTimestamp { input: String, template: String },

    /// Reference object could not be examined
    #[error("Cannot access reference object '{path}': {source}")]
    ReferenceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Computed target time cannot be represented
    #[error("Time expression '{input}' is out of range")]
    OutOfRange { input: String },
}

impl TimeError {
    #[must_use]
    pub fn invalid_age(input: &str, reason: &str) -> Self {
        Self::InvalidAge {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn out_of_range(input: &str) -> Self {
        Self::OutOfRange {
            input: input.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
