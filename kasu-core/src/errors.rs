//! errors.rs - Error and warning types for the kasu-core library.
//!
//! Most failures in kasu-core are recoverable: a bad ignore-pattern line, an
//! unreadable directory or a malformed replacement line is skipped and reported
//! as a [`Warning`] next to the result instead of aborting the run. Only
//! resource-level failures (the scan root missing, a detector failing to
//! compile) surface as `Err`.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// This enum represents all possible error types in the `kasu-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KasuError {
    #[error("Invalid ignore pattern on line {line} ('{pattern}'): {reason}")]
    PatternSyntax {
        line: usize,
        pattern: String,
        reason: String,
    },

    #[error("Cannot access '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Skipping replacement rule on line {line} ('{content}'): {reason}")]
    ReplacementFile {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Input directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Failed to compile detector '{0}': {1}")]
    DetectorCompilation(String, regex::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl KasuError {
    /// Returns true for errors the core recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KasuError::PatternSyntax { .. }
                | KasuError::FileAccess { .. }
                | KasuError::ReplacementFile { .. }
        )
    }
}

/// A recovered error, reported alongside a successful result.
#[derive(Debug)]
pub struct Warning(pub KasuError);

impl Warning {
    pub fn error(&self) -> &KasuError {
        &self.0
    }
}

impl From<KasuError> for Warning {
    fn from(err: KasuError) -> Self {
        Warning(err)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning: {}", self.0)
    }
}
