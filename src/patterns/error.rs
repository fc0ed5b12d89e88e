use thiserror::Error;

/// Errors produced while building a pattern chain
#[derive(Debug, Error)]
pub enum PatternError {
    /// Regex failed to compile
    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
    /// Too many rules were chained together
    #[error("Too many pattern rules: {provided} (max {max})")]
    TooManyPatterns { provided: usize, max: usize },
}

impl PatternError {
    #[must_use]
    pub fn regex_compile(pattern: &str, reason: &str) -> Self {
        Self::InvalidRegex {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}
