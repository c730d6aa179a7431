// kasu-core/src/replacements.rs
//! Custom literal replacement rules.
//!
//! A replacement file holds one rule per line. Two line shapes are accepted:
//!
//! * `from -> to` splits at the first `->`, so both sides may contain spaces.
//! * `Company Inc. Acme` treats the **last** whitespace-delimited token as `to`
//!   and the remaining tokens, joined by single spaces, as `from`.
//!
//! Blank lines and lines starting with `#` are skipped. Malformed lines and
//! repeated `from` values are reported as [`Warning`]s; the first definition
//! of a `from` value wins.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::errors::{KasuError, Warning};

const ARROW: &str = "->";

/// A literal, case-sensitive substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomReplacementRule {
    pub from: String,
    pub to: String,
}

impl CustomReplacementRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Parses replacement lines in file order.
pub fn parse<I, S>(lines: I) -> (Vec<CustomReplacementRule>, Vec<Warning>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rules = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, raw) in lines.into_iter().enumerate() {
        let line_number = idx + 1;
        let line = raw.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let rule = match parse_line(line) {
            Ok(rule) => rule,
            Err(reason) => {
                let err = KasuError::ReplacementFile {
                    line: line_number,
                    content: line.to_string(),
                    reason: reason.to_string(),
                };
                warn!("{}", err);
                warnings.push(err.into());
                continue;
            }
        };

        if !seen.insert(rule.from.clone()) {
            let err = KasuError::ReplacementFile {
                line: line_number,
                content: line.to_string(),
                reason: format!("'{}' is already defined by an earlier line", rule.from),
            };
            warn!("{}", err);
            warnings.push(err.into());
            continue;
        }

        debug!("Replacement rule {}: '{}' -> '{}'", line_number, rule.from, rule.to);
        rules.push(rule);
    }

    (rules, warnings)
}

fn parse_line(line: &str) -> Result<CustomReplacementRule, &'static str> {
    if let Some((from, to)) = line.split_once(ARROW) {
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err("both sides of '->' must be non-empty");
        }
        return Ok(CustomReplacementRule::new(from, to));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.split_last() {
        Some((to, from)) if !from.is_empty() => Ok(CustomReplacementRule::new(from.join(" "), *to)),
        _ => Err("expected at least two tokens"),
    }
}

/// Reads and parses a UTF-8 replacement file.
pub fn load_replacement_file<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<CustomReplacementRule>, Vec<Warning>)> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replacement file {}", path.display()))?;
    let (rules, warnings) = parse(text.lines());
    info!(
        "Loaded {} replacement rules from {} ({} lines skipped).",
        rules.len(),
        path.display(),
        warnings.len()
    );
    Ok((rules, warnings))
}
