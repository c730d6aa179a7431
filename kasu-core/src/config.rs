// kasu-core/src/config.rs
//! YAML configuration for kasu runs.
//!
//! A config file is a flat mapping. `glob` and `exclude` take either a list
//! of patterns or a single comma-separated string:
//!
//! ```yaml
//! glob: "*.py, *.md"
//! exclude:
//!   - tests/
//! ignore_file: .kasuignore
//! sanitize: true
//! replace_file: replacements.txt
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::EngineOptions;
use crate::errors::KasuError;
use crate::selector::{IgnoreSource, SelectorOptions};

/// File names tried by [`KasuConfig::discover`], in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[".config.yaml", ".config.yml", ".config"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KasuConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub glob: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub exclude: Vec<String>,
    pub ignore_file: Option<PathBuf>,
    pub no_auto_ignore: bool,
    pub sanitize: bool,
    pub replace_file: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternList {
    Joined(String),
    List(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let patterns = match Option::<PatternList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(PatternList::Joined(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        Some(PatternList::List(list)) => list,
    };
    Ok(patterns)
}

impl KasuConfig {
    /// Loads and validates one YAML config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading config from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        // An empty document is an empty config.
        let config: KasuConfig = if text.trim().is_empty() {
            KasuConfig::default()
        } else {
            serde_yml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        };
        config.validate()?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// Returns the first of [`DEFAULT_CONFIG_FILES`] in `dir` that loads.
    ///
    /// Files that exist but fail to load are logged and skipped.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<(PathBuf, Self)> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if !candidate.is_file() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Some((candidate, config)),
                Err(e) => warn!("Error loading config file {}: {:#}", candidate.display(), e),
            }
        }
        None
    }

    /// Rejects empty pattern entries.
    pub fn validate(&self) -> Result<(), KasuError> {
        for (key, patterns) in [("glob", &self.glob), ("exclude", &self.exclude)] {
            if let Some(pos) = patterns.iter().position(|p| p.trim().is_empty()) {
                return Err(KasuError::Config(format!(
                    "'{}' entry {} is empty",
                    key,
                    pos + 1
                )));
            }
        }
        Ok(())
    }

    /// Selector options for scanning `root`. An explicit ignore file takes
    /// precedence over `no_auto_ignore`.
    pub fn selector_options(&self, root: impl Into<PathBuf>) -> SelectorOptions {
        let ignore_source = match (&self.ignore_file, self.no_auto_ignore) {
            (Some(path), _) => IgnoreSource::Explicit(path.clone()),
            (None, true) => IgnoreSource::Disabled,
            (None, false) => IgnoreSource::AutoDetect,
        };
        SelectorOptions::new(root)
            .with_include(self.glob.iter().cloned())
            .with_exclude(self.exclude.iter().cloned())
            .with_ignore_source(ignore_source)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            auto_detect: self.sanitize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_glob() {
        let config: KasuConfig = serde_yml::from_str("glob: \"*.py, *.md\"\n").unwrap();
        assert_eq!(config.glob, vec!["*.py", "*.md"]);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_list_exclude_and_flags() {
        let yaml = "exclude:\n  - tests/\n  - '*.lock'\nsanitize: true\nno_auto_ignore: true\n";
        let config: KasuConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.exclude, vec!["tests/", "*.lock"]);
        assert!(config.engine_options().auto_detect);
        assert_eq!(
            config.selector_options("/tmp").ignore_source,
            IgnoreSource::Disabled
        );
    }

    #[test]
    fn test_explicit_ignore_file_wins() {
        let config = KasuConfig {
            ignore_file: Some(PathBuf::from("custom.ignore")),
            no_auto_ignore: true,
            ..KasuConfig::default()
        };
        assert_eq!(
            config.selector_options("/tmp").ignore_source,
            IgnoreSource::Explicit(PathBuf::from("custom.ignore"))
        );
    }

    #[test]
    fn test_validate_rejects_empty_entry() {
        let config = KasuConfig {
            glob: vec!["*.rs".to_string(), " ".to_string()],
            ..KasuConfig::default()
        };
        assert!(matches!(config.validate(), Err(KasuError::Config(_))));
    }
}
