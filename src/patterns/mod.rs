//! Name pattern chains
//!
//! A [`PatternChain`] is an ordered list of [`MatchRule`]s. A name is accepted
//! when every rule agrees with it: INCLUDE rules must match, EXCLUDE rules must
//! not. An empty chain accepts every name.
//!
//! Chains are built left to right from pattern options. An initializing
//! option (`-p`/`-x`) replaces the whole chain; an extending option
//! (`-P`/`-X`) appends to it.

pub mod error;
pub mod rule;

pub use error::PatternError;
pub use rule::{MatchRule, Polarity};

/// Default maximum number of rules in one chain
pub const DEFAULT_MAX_PATTERNS: usize = 4;

/// One pattern option as it appeared on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOp {
    /// Clear the chain, then add the rule
    Initialize { pattern: String, polarity: Polarity },
    /// Append the rule to the current chain
    Extend { pattern: String, polarity: Polarity },
}

/// Ordered, bounded list of match rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternChain {
    rules: Vec<MatchRule>,
    max: usize,
}

impl Default for PatternChain {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATTERNS)
    }
}

impl PatternChain {
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { rules: Vec::new(), max }
    }

    /// Replace the chain with a single rule.
    ///
    /// # Errors
    /// Returns a compile error, or `TooManyPatterns` if the bound is zero.
    pub fn initialize(&mut self, pattern: &str, polarity: Polarity, ignore_case: bool) -> Result<(), PatternError> {
        let rule = MatchRule::new(pattern, polarity, ignore_case)?;
        self.rules.clear();
        self.push(rule)
    }

    /// Append a rule to the chain.
    ///
    /// # Errors
    /// Returns a compile error, or `TooManyPatterns` if the chain is full.
    pub fn extend(&mut self, pattern: &str, polarity: Polarity, ignore_case: bool) -> Result<(), PatternError> {
        let rule = MatchRule::new(pattern, polarity, ignore_case)?;
        self.push(rule)
    }

    /// Apply one command-line pattern option.
    ///
    /// # Errors
    /// See [`PatternChain::initialize`] and [`PatternChain::extend`].
    pub fn apply(&mut self, op: &PatternOp, ignore_case: bool) -> Result<(), PatternError> {
        match op {
            PatternOp::Initialize { pattern, polarity } => self.initialize(pattern, *polarity, ignore_case),
            PatternOp::Extend { pattern, polarity } => self.extend(pattern, *polarity, ignore_case),
        }
    }

    fn push(&mut self, rule: MatchRule) -> Result<(), PatternError> {
        if self.rules.len() >= self.max {
            return Err(PatternError::TooManyPatterns {
                provided: self.rules.len() + 1,
                max: self.max,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Whether `name` satisfies every rule
    #[must_use]
    pub fn matches(&self, name: impl AsRef<[u8]>) -> bool {
        let name = name.as_ref();
        self.rules.iter().all(|rule| rule.accepts(name))
    }

    #[must_use]
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }
}
