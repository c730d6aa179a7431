// kasu-core/src/lib.rs
//! # Kasu Core Library
//!
//! `kasu-core` holds the logic behind merging a directory tree into a single
//! document: deciding which files take part, and scrubbing sensitive data out
//! of their contents before anything is written. Output formatting (plain
//! text, markdown, tree views) lives outside this crate and consumes the
//! ordered results produced here.
//!
//! ## Modules
//!
//! * `patterns`: Gitignore-compatible pattern compilation with last-match-wins evaluation.
//! * `selector`: Deterministic directory walk applying ignore rules, exclude patterns and include globs.
//! * `replacements`: Parsing of custom literal replacement files.
//! * `detectors`: The built-in sensitive-data categories and their regular expressions.
//! * `engine`: The `RedactionEngine`, which scans text without mutating anything.
//! * `context`: The caller-owned `RunContext` that numbers placeholders for one run.
//! * `config`: YAML configuration model.
//! * `statistics`: Size, line and extension breakdowns of a selection.
//! * `headless`: One-shot helpers that tie selection and redaction together.
//! * `logging`: Debug logging helpers that mask matched values.
//! * `errors`: The `KasuError` type and recoverable `Warning`s.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use kasu_core::{FileSelector, SelectorOptions, RedactionEngine, EngineOptions, RunContext};
//! use kasu_core::headless::collect_sanitized;
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     // 1. Select every Python file under the project, honoring its .gitignore.
//!     let options = SelectorOptions::new("./project").with_include(["*.py"]);
//!     let selection = FileSelector::new(options).select()?;
//!
//!     // 2. One engine and one run context for the whole invocation.
//!     let engine = RedactionEngine::new(EngineOptions::default())?;
//!     let mut ctx = RunContext::new(Vec::new());
//!
//!     // 3. Sanitize in enumeration order so placeholder numbering is stable.
//!     let mut warnings = Vec::new();
//!     for (path, content) in collect_sanitized(&selection, Some(&engine), &mut ctx, &mut warnings) {
//!         println!("## {}\n{}", path, content);
//!     }
//!     for item in ctx.summary() {
//!         println!("{}: {}", item.label, item.occurrences);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Malformed pattern lines, unreadable entries and bad replacement lines are
//! recovered locally and returned as [`Warning`]s next to the result. Only a
//! missing scan root or a detector that fails to compile is an `Err`.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod context;
pub mod detectors;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod logging;
pub mod patterns;
pub mod replacements;
pub mod selector;
pub mod statistics;

pub use config::KasuConfig;
pub use context::{RedactionSummaryItem, RunContext};
pub use detectors::Category;
pub use engine::{replace_custom, Detection, EngineOptions, RedactionEngine, Scan};
pub use errors::{KasuError, Warning};
pub use headless::{collect_sanitized, headless_collect};
pub use patterns::{IgnoreRule, PatternSet};
pub use replacements::{load_replacement_file, CustomReplacementRule};
pub use selector::{FileRecord, FileSelector, IgnoreSource, Selection, SelectionSummary, SelectorOptions};
pub use statistics::{format_size, FileStatistics};
