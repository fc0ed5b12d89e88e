//! Configuration for findfiles
//!
//! [`Settings`] are persistent user preferences, layered from built-in
//! defaults, an optional TOML file in the user's config directory
//! (`~/.config/findfiles/config.toml` on Linux) and `FINDFILES_*` environment
//! variables, later layers winning. Command-line options override all of them.
//!
//! [`SearchConfig`] is the record a single run is driven by. It is built once
//! by the command-line layer and passed by reference into the search. Each
//! target carries its own [`TargetSearch`], since options apply to the
//! targets that follow them.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::patterns::{DEFAULT_MAX_PATTERNS, PatternChain};
use crate::report::{DisplayOptions, SizeScale};
use crate::select::{Selector, TypeFilter};
use crate::time::{DEFAULT_TIMESTAMP_FORMAT, SelectionCriterion, TimeValue};
use crate::walk::WalkOptions;

/// Prefix of the environment variables read into [`Settings`]
pub const ENV_PREFIX: &str = "FINDFILES";

/// User preferences
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// strftime template for absolute timestamp criteria
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Maximum number of rules in a pattern chain
    #[serde(default = "default_max_patterns")]
    pub max_patterns: usize,

    /// Print sizes scaled by this base (1000 or 1024) by default
    #[serde(default)]
    pub human: Option<u32>,

    /// Follow symbolic links by default
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

const fn default_max_patterns() -> usize {
    DEFAULT_MAX_PATTERNS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            max_patterns: default_max_patterns(),
            human: None,
            follow_symlinks: false,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("findfiles").join("config.toml"))
    }

    /// Load settings from the user's config file and the environment
    ///
    /// A missing file is not an error; a missing config directory only
    /// skips the file layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or an environment variable cannot be
    /// parsed, or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Load settings from an explicit file and environment source
    ///
    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn load_from(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("timestamp_format", defaults.timestamp_format)?
            .set_default("max_patterns", defaults.max_patterns as u64)?
            .set_default("follow_symlinks", defaults.follow_symlinks)?;

        if let Some(path) = file {
            tracing::debug!("reading settings from '{}'", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let settings: Self = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_format.trim().is_empty() {
            return Err(ConfigError::Message("timestamp_format must not be empty".to_string()));
        }
        if self.max_patterns == 0 {
            return Err(ConfigError::Message("max_patterns must be at least 1".to_string()));
        }
        if let Some(base) = self.human
            && SizeScale::from_base(base).is_none()
        {
            return Err(ConfigError::Message(format!("human must be 1000 or 1024, got {base}")));
        }
        Ok(())
    }

    /// Default size scale, if any
    #[must_use]
    pub fn size_scale(&self) -> Option<SizeScale> {
        self.human.and_then(SizeScale::from_base)
    }
}

/// One target together with the options in effect where it appeared
#[derive(Debug, Clone)]
pub struct TargetSearch {
    pub target: String,
    pub types: TypeFilter,
    pub walk: WalkOptions,
    pub chain: PatternChain,
    /// The last time criterion given before the target, if any
    pub criterion: Option<SelectionCriterion>,
}

impl TargetSearch {
    /// A search of `target` that selects nothing yet
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            types: TypeFilter::default(),
            walk: WalkOptions::default(),
            chain: PatternChain::default(),
            criterion: None,
        }
    }

    /// The predicate for this target
    #[must_use]
    pub fn selector(&self) -> Selector {
        Selector::new(self.chain.clone(), self.criterion, self.types)
    }
}

/// Everything one run needs, resolved from settings and the command line
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Targets to search, in command-line order
    pub targets: Vec<TargetSearch>,
    pub display: DisplayOptions,
    /// The instant ages are measured from
    pub start: TimeValue,
}

impl SearchConfig {
    /// A configuration without targets, measured from `start`
    #[must_use]
    pub fn new(start: TimeValue) -> Self {
        Self {
            targets: Vec::new(),
            display: DisplayOptions::default(),
            start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.timestamp_format, "%Y%m%d_%H%M%S");
        assert_eq!(settings.max_patterns, 4);
        assert!(settings.human.is_none());
        assert!(!settings.follow_symlinks);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load_from(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path), env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_patterns = 8\nhuman = 1000\nfollow_symlinks = true\n").unwrap();

        let settings = Settings::load_from(Some(&path), env(&[])).unwrap();
        assert_eq!(settings.max_patterns, 8);
        assert_eq!(settings.size_scale(), Some(SizeScale::Decimal));
        assert!(settings.follow_symlinks);
        assert_eq!(settings.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_patterns = 8\n").unwrap();

        let settings = Settings::load_from(
            Some(&path),
            env(&[("FINDFILES_MAX_PATTERNS", "6"), ("FINDFILES_TIMESTAMP_FORMAT", "%Y-%m-%d")]),
        )
        .unwrap();
        assert_eq!(settings.max_patterns, 6);
        assert_eq!(settings.timestamp_format, "%Y-%m-%d");
    }

    #[test]
    fn test_invalid_human_base_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "human = 512\n").unwrap();
        let err = Settings::load_from(Some(&path), env(&[])).unwrap_err();
        assert!(err.to_string().contains("1000 or 1024"));
    }

    #[test]
    fn test_zero_max_patterns_is_rejected() {
        let settings = Settings { max_patterns: 0, ..Settings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_target_search_selector_defaults() {
        let search = TargetSearch::new("dir");
        let selector = search.selector();
        assert!(!selector.types().any());
        assert!(selector.criterion().is_none());
        assert!(SearchConfig::new(TimeValue::from_secs(5)).targets.is_empty());
    }
}
