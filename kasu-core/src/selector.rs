// kasu-core/src/selector.rs
//! Directory walking and file selection.
//!
//! [`FileSelector`] walks a root directory depth-first with `walkdir`, never
//! following symlinks. Within a directory files are emitted before
//! subdirectories and both are ordered by file name, so two runs over the
//! same tree always produce the same sequence. A stack of
//! `(depth, PatternSet)` pairs tracks the rules in effect for the directory
//! being listed; each level is the parent's rules plus its own `.gitignore`.
//!
//! Per-entry failures (unreadable directories, unreadable files) never abort
//! the walk: they become [`Warning`]s on the returned [`Selection`]. Only a
//! missing or non-directory root is an error.
//!
//! License: MIT OR APACHE 2.0

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{KasuError, Warning};
use crate::patterns::{read_pattern_lines, PatternSet, VCS_PATTERNS};

/// Number of leading bytes inspected for a null byte.
pub const BINARY_SNIFF_LEN: usize = 8000;

/// Name of the ignore file picked up in auto-detect mode.
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Where ignore rules come from. The variants are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IgnoreSource {
    /// Use exactly this file; nested ignore files are not consulted.
    Explicit(PathBuf),
    /// Use `<root>/.gitignore` when present, plus nested `.gitignore` files.
    #[default]
    AutoDetect,
    Disabled,
}

/// A selected file. Immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// Root-relative, always `/`-separated.
    pub relative_path: String,
    pub is_directory: bool,
    /// False when a null byte was found in the first [`BINARY_SNIFF_LEN`] bytes.
    pub is_text: bool,
    pub size: u64,
}

/// Counters for one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Number of selected records.
    pub found: usize,
    /// Files and pruned directories rejected by ignore rules.
    pub ignored_by_pattern: usize,
    pub excluded: usize,
    pub glob_filtered: usize,
    /// Selected records flagged as binary.
    pub non_text: usize,
    pub symlinks_skipped: usize,
    pub access_errors: usize,
}

/// The result of [`FileSelector::select`].
#[derive(Debug, Default)]
pub struct Selection {
    pub records: Vec<FileRecord>,
    pub summary: SelectionSummary,
    pub warnings: Vec<Warning>,
}

impl Selection {
    /// The `(relative_path, is_text)` view handed to output assemblers.
    pub fn listing(&self) -> Vec<(&str, bool)> {
        self.records
            .iter()
            .map(|r| (r.relative_path.as_str(), r.is_text))
            .collect()
    }

    pub fn text_records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.is_text)
    }
}

/// Inputs of a selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectorOptions {
    pub root: PathBuf,
    /// OR semantics; empty means every file is included.
    pub include: Vec<String>,
    /// Always wins over `include`.
    pub exclude: Vec<String>,
    pub ignore_source: IgnoreSource,
}

impl SelectorOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_include<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_source(mut self, source: IgnoreSource) -> Self {
        self.ignore_source = source;
        self
    }
}

/// Why a file was left out.
enum Verdict {
    Selected,
    Ignored,
    Excluded,
    GlobFiltered,
}

/// Walks a root directory and selects files according to [`SelectorOptions`].
#[derive(Debug, Clone)]
pub struct FileSelector {
    options: SelectorOptions,
}

/// Include and exclude lists compiled for one run.
struct Filters {
    include: Option<PatternSet>,
    exclude: PatternSet,
}

impl Filters {
    fn compile(options: &SelectorOptions, warnings: &mut Vec<Warning>) -> Self {
        let include = if options.include.is_empty() {
            None
        } else {
            let (set, w) = PatternSet::compile(&options.include);
            warnings.extend(w);
            Some(set)
        };
        let (exclude, w) = PatternSet::compile(&options.exclude);
        warnings.extend(w);
        Self { include, exclude }
    }

    /// Ignore rules, then exclude patterns, then include globs.
    fn classify(&self, rules: &PatternSet, rel_path: &str) -> Verdict {
        if rules.is_ignored(rel_path, false) {
            return Verdict::Ignored;
        }
        if self.exclude.is_ignored(rel_path, false) {
            return Verdict::Excluded;
        }
        match &self.include {
            Some(include) if !include.is_ignored(rel_path, false) => Verdict::GlobFiltered,
            _ => Verdict::Selected,
        }
    }
}

impl FileSelector {
    pub fn new(options: SelectorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    /// Walks the tree once and returns the ordered selection.
    pub fn select(&self) -> Result<Selection, KasuError> {
        let root = &self.options.root;
        let root_meta = match fs::metadata(root) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KasuError::RootNotFound(root.clone()));
            }
            Err(e) => return Err(KasuError::Io(e)),
        };
        if !root_meta.is_dir() {
            return Err(KasuError::RootNotDirectory(root.clone()));
        }

        let mut selection = Selection::default();
        let filters = Filters::compile(&self.options, &mut selection.warnings);
        let root_rules = self.root_rules(&mut selection.warnings);
        let mut rule_stack: Vec<(usize, Arc<PatternSet>)> = vec![(0, Arc::new(root_rules))];

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by(files_first_by_name)
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                    let err = KasuError::FileAccess {
                        path,
                        source: std::io::Error::from(e),
                    };
                    warn!("{}", err);
                    selection.warnings.push(err.into());
                    selection.summary.access_errors += 1;
                    continue;
                }
            };

            // Entries at depth d are listed from the directory pushed at depth d - 1.
            while rule_stack.len() > 1
                && rule_stack.last().map_or(false, |(depth, _)| *depth >= entry.depth())
            {
                rule_stack.pop();
            }
            let rules = match rule_stack.last() {
                Some((_, rules)) => Arc::clone(rules),
                None => continue,
            };

            let rel_path = relative_path(root, entry.path());
            let file_type = entry.file_type();

            if file_type.is_symlink() {
                debug!("[SKIPPED SYMLINK] {}", rel_path);
                selection.summary.symlinks_skipped += 1;
                continue;
            }

            if file_type.is_dir() {
                if rules.is_ignored(&rel_path, true) && !rules.may_reinclude_under(&rel_path) {
                    debug!("[IGNORED DIR] {}/", rel_path);
                    selection.summary.ignored_by_pattern += 1;
                    walker.skip_current_dir();
                    continue;
                }
                let local =
                    self.with_local_rules(entry.path(), &rel_path, rules, &mut selection.warnings);
                rule_stack.push((entry.depth(), local));
                continue;
            }

            match filters.classify(&rules, &rel_path) {
                Verdict::Ignored => {
                    debug!("[IGNORED] {}", rel_path);
                    selection.summary.ignored_by_pattern += 1;
                }
                Verdict::Excluded => {
                    debug!("[EXCLUDED] {}", rel_path);
                    selection.summary.excluded += 1;
                }
                Verdict::GlobFiltered => {
                    debug!("[GLOB NOT MATCHED] {}", rel_path);
                    selection.summary.glob_filtered += 1;
                }
                Verdict::Selected => match file_record(&entry, rel_path) {
                    Ok(record) => {
                        debug!("[ADDED] {} (text={})", record.relative_path, record.is_text);
                        if !record.is_text {
                            selection.summary.non_text += 1;
                        }
                        selection.records.push(record);
                    }
                    Err(err) => {
                        warn!("{}", err);
                        selection.warnings.push(err.into());
                        selection.summary.access_errors += 1;
                    }
                },
            }
        }

        selection.summary.found = selection.records.len();
        info!(
            "Found {} files ({} ignored by patterns, {} excluded, {} filtered by glob).",
            selection.summary.found,
            selection.summary.ignored_by_pattern,
            selection.summary.excluded,
            selection.summary.glob_filtered
        );
        Ok(selection)
    }

    fn root_rules(&self, warnings: &mut Vec<Warning>) -> PatternSet {
        match &self.options.ignore_source {
            IgnoreSource::Disabled => PatternSet::new(),
            IgnoreSource::Explicit(path) => match read_pattern_lines(path) {
                Ok(lines) => {
                    debug!("Using specified ignore file: {}", path.display());
                    let (set, w) = PatternSet::compile(lines);
                    warnings.extend(w);
                    set
                }
                Err(e) => {
                    let err = KasuError::FileAccess {
                        path: path.clone(),
                        source: e,
                    };
                    warn!("Ignore file not usable, continuing without ignore rules: {}", err);
                    warnings.push(err.into());
                    PatternSet::new()
                }
            },
            IgnoreSource::AutoDetect => {
                let gitignore = self.options.root.join(GITIGNORE_FILE_NAME);
                if !gitignore.is_file() {
                    debug!("No {} found at scan root.", GITIGNORE_FILE_NAME);
                    return PatternSet::new();
                }
                info!("Auto-detected and using: {}", gitignore.display());
                let lines = match read_pattern_lines(&gitignore) {
                    Ok(lines) => lines,
                    Err(e) => {
                        let err = KasuError::FileAccess {
                            path: gitignore,
                            source: e,
                        };
                        warn!("{}", err);
                        warnings.push(err.into());
                        Vec::new()
                    }
                };
                let (mut set, _) = PatternSet::compile(VCS_PATTERNS.iter().copied());
                let (local, w) = PatternSet::compile(lines);
                warnings.extend(w);
                set.append(&local);
                set
            }
        }
    }

    /// Concatenates a directory's own `.gitignore` onto the inherited rules.
    fn with_local_rules(
        &self,
        dir: &Path,
        rel_dir: &str,
        inherited: Arc<PatternSet>,
        warnings: &mut Vec<Warning>,
    ) -> Arc<PatternSet> {
        if self.options.ignore_source != IgnoreSource::AutoDetect {
            return inherited;
        }
        let local_file = dir.join(GITIGNORE_FILE_NAME);
        if !local_file.is_file() {
            return inherited;
        }
        match read_pattern_lines(&local_file) {
            Ok(lines) => {
                debug!("Applying nested ignore file: {}", local_file.display());
                let (local, w) = PatternSet::compile_with_base(lines, rel_dir);
                warnings.extend(w);
                Arc::new(inherited.concat(&local))
            }
            Err(e) => {
                let err = KasuError::FileAccess {
                    path: local_file,
                    source: e,
                };
                warn!("{}", err);
                warnings.push(err.into());
                inherited
            }
        }
    }
}

fn file_record(entry: &DirEntry, relative_path: String) -> Result<FileRecord, KasuError> {
    let access_error = |source: std::io::Error| KasuError::FileAccess {
        path: entry.path().to_path_buf(),
        source,
    };
    let size = entry
        .metadata()
        .map_err(|e| access_error(std::io::Error::from(e)))?
        .len();
    let is_text = sniff_is_text(entry.path()).map_err(access_error)?;
    Ok(FileRecord {
        absolute_path: entry.path().to_path_buf(),
        relative_path,
        is_directory: false,
        is_text,
        size,
    })
}

/// Files (and symlinks) before directories, each group by file name.
fn files_first_by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Root-relative, `/`-separated form of `path`.
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads up to [`BINARY_SNIFF_LEN`] bytes and reports whether no null byte was seen.
pub fn sniff_is_text(path: &Path) -> std::io::Result<bool> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(BINARY_SNIFF_LEN);
    file.take(BINARY_SNIFF_LEN as u64).read_to_end(&mut buf)?;
    Ok(!buf.contains(&0))
}
