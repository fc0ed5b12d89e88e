use regex::bytes::{Regex, RegexBuilder};

use super::error::PatternError;

/// Whether a rule requires a match or the absence of one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

/// A compiled name pattern with its polarity
#[derive(Debug, Clone)]
pub struct MatchRule {
    original: String,
    compiled: Regex,
    ignore_case: bool,
    polarity: Polarity,
}

impl MatchRule {
    /// Compile a rule.
    ///
    /// Case sensitivity is fixed here; later changes to the caller's
    /// case flag do not affect an already compiled rule.
    ///
    /// # Errors
    /// Returns `PatternError::InvalidRegex` carrying the regex engine's message.
    pub fn new(pattern: &str, polarity: Polarity, ignore_case: bool) -> Result<Self, PatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map(|compiled| Self {
                original: pattern.to_string(),
                compiled,
                ignore_case,
                polarity,
            })
            .map_err(|e| PatternError::regex_compile(pattern, &e.to_string()))
    }

    /// Whether `name` satisfies this rule
    ///
    /// Names are matched as raw bytes, so a name that is not valid UTF-8 is
    /// matched as it is stored.
    #[must_use]
    pub fn accepts(&self, name: &[u8]) -> bool {
        self.compiled.is_match(name) == (self.polarity == Polarity::Include)
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

impl PartialEq for MatchRule {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original
            && self.ignore_case == other.ignore_case
            && self.polarity == other.polarity
    }
}

impl Eq for MatchRule {}
