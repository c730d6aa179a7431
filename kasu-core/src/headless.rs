// kasu-core/src/headless.rs
//! One-shot helpers for driving the core without a UI.
//!
//! [`collect_sanitized`] is the narrow interface an output assembler (text,
//! markdown, tree view) consumes: selected text files in enumeration order,
//! each paired with its possibly redacted content.
//!
//! License: MIT OR APACHE 2.0

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::context::RunContext;
use crate::engine::{replace_custom, EngineOptions, RedactionEngine};
use crate::errors::{KasuError, Warning};
use crate::replacements::CustomReplacementRule;
use crate::selector::{FileSelector, Selection, SelectorOptions};

/// Text records of `selection` as `(relative_path, content)` pairs.
///
/// Without an engine only the custom rules in `ctx` are applied and the
/// built-in detectors stay off. Unreadable files are skipped and reported
/// through `warnings`.
pub fn collect_sanitized(
    selection: &Selection,
    engine: Option<&RedactionEngine>,
    ctx: &mut RunContext,
    warnings: &mut Vec<Warning>,
) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(selection.records.len());
    for record in selection.text_records() {
        let bytes = match std::fs::read(&record.absolute_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = KasuError::FileAccess {
                    path: record.absolute_path.clone(),
                    source: e,
                };
                warn!("{}", err);
                warnings.push(err.into());
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let content = match engine {
            Some(engine) => engine.sanitize(&content, ctx),
            None => replace_custom(&content, ctx),
        };
        debug!("Collected {} ({} bytes)", record.relative_path, content.len());
        out.push((record.relative_path.clone(), content));
    }
    out
}

/// Selects files under `root`, then sanitizes them in one fresh run.
///
/// Returns the collected files, the run context (for its summary) and every
/// warning raised along the way.
pub fn headless_collect<P: AsRef<Path>>(
    root: P,
    rules: Vec<CustomReplacementRule>,
    options: EngineOptions,
) -> Result<(Vec<(String, String)>, RunContext, Vec<Warning>)> {
    let root = root.as_ref();
    let mut selection = FileSelector::new(SelectorOptions::new(root))
        .select()
        .with_context(|| format!("Failed to select files under {}", root.display()))?;
    let engine = RedactionEngine::new(options).context("Failed to build redaction engine")?;
    let mut ctx = RunContext::new(rules);
    let mut warnings = std::mem::take(&mut selection.warnings);
    let files = collect_sanitized(&selection, Some(&engine), &mut ctx, &mut warnings);
    Ok((files, ctx, warnings))
}
