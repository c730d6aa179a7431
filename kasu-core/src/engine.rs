// kasu-core/src/engine.rs
//! The redaction engine.
//!
//! Redaction is split into two steps so detection can run anywhere while
//! placeholder numbering stays strictly ordered:
//!
//! 1. [`RedactionEngine::scan`] is pure. It claims byte spans of the input,
//!    first for custom literal rules (longest `from` first), then for each
//!    built-in detector. Every step only claims bytes no earlier step has
//!    claimed, so the resulting spans are pairwise disjoint. Detectors still
//!    match against the whole input, so `\b` next to a replaced span behaves
//!    as it would in the unreplaced text.
//! 2. [`RunContext::apply`](crate::context::RunContext::apply) turns a
//!    [`Scan`] into redacted text, assigning per-category indices in the
//!    order values are first seen during the run.
//!
//! License: MIT OR APACHE 2.0

use std::ops::Range;

use log::debug;

use crate::context::RunContext;
use crate::detectors::{compile_all, Category, Detector};
use crate::errors::KasuError;
use crate::logging::log_detection_debug;
use crate::replacements::CustomReplacementRule;

/// Engine switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Run the built-in detectors. Custom rules always apply.
    pub auto_detect: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { auto_detect: true }
    }
}

/// A value claimed by a built-in detector. Offsets point into the scanned input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub category: Category,
    pub start: usize,
    pub end: usize,
    pub value: String,
}

/// An occurrence of a custom rule's `from` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSpan {
    /// Index into the rule slice passed to [`RedactionEngine::scan`].
    pub rule_index: usize,
    pub start: usize,
    pub end: usize,
}

/// The result of scanning one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    custom_spans: Vec<CustomSpan>,
    detections: Vec<Detection>,
}

impl Scan {
    /// Detections ordered by start offset.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Custom rule spans ordered by start offset.
    pub fn custom_spans(&self) -> &[CustomSpan] {
        &self.custom_spans
    }

    pub fn is_empty(&self) -> bool {
        self.custom_spans.is_empty() && self.detections.is_empty()
    }
}

/// Holds the compiled detectors. Cheap to share between threads.
#[derive(Debug, Clone)]
pub struct RedactionEngine {
    detectors: Vec<Detector>,
    options: EngineOptions,
}

impl RedactionEngine {
    pub fn new(options: EngineOptions) -> Result<Self, KasuError> {
        let detectors = if options.auto_detect {
            compile_all()?
        } else {
            Vec::new()
        };
        debug!(
            "RedactionEngine created with {} detectors (auto_detect={}).",
            detectors.len(),
            options.auto_detect
        );
        Ok(Self { detectors, options })
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Finds every span to redact in `text` without touching any run state.
    pub fn scan(&self, text: &str, rules: &[CustomReplacementRule]) -> Scan {
        let mut scan = Scan::default();
        let mut raw = claim_custom(text, rules, &mut scan.custom_spans);

        for detector in &self.detectors {
            let category = detector.category();
            let detections = &mut scan.detections;
            raw = claim(raw, |window| detector.find_spans(text, window), |span| {
                let value = &text[span.clone()];
                log_detection_debug(category.label(), value, span.start, span.end);
                detections.push(Detection {
                    category,
                    start: span.start,
                    end: span.end,
                    value: value.to_string(),
                });
            });
        }

        scan.custom_spans.sort_by_key(|s| s.start);
        scan.detections.sort_by_key(|d| d.start);
        scan
    }

    /// Scans `text` and applies the result to `ctx`.
    pub fn sanitize(&self, text: &str, ctx: &mut RunContext) -> String {
        let scan = self.scan(text, ctx.rules());
        ctx.apply(text, &scan)
    }
}

/// Applies only the custom rules held by `ctx`, with no built-in detection.
pub fn replace_custom(text: &str, ctx: &mut RunContext) -> String {
    let mut scan = Scan::default();
    claim_custom(text, ctx.rules(), &mut scan.custom_spans);
    scan.custom_spans.sort_by_key(|s| s.start);
    ctx.apply(text, &scan)
}

/// Claims custom rule occurrences, longest `from` first. Returns the unclaimed segments.
fn claim_custom(
    text: &str,
    rules: &[CustomReplacementRule],
    custom_spans: &mut Vec<CustomSpan>,
) -> Vec<Range<usize>> {
    let mut raw: Vec<Range<usize>> = vec![0..text.len()];

    let mut by_length: Vec<usize> = (0..rules.len()).collect();
    by_length.sort_by(|a, b| rules[*b].from.len().cmp(&rules[*a].from.len()));

    for rule_index in by_length {
        let from = rules[rule_index].from.as_str();
        if from.is_empty() {
            continue;
        }
        let find = |window: Range<usize>| -> Vec<Range<usize>> {
            text[window.clone()]
                .match_indices(from)
                .map(|(i, m)| window.start + i..window.start + i + m.len())
                .collect()
        };
        raw = claim(raw, find, |span| {
            custom_spans.push(CustomSpan {
                rule_index,
                start: span.start,
                end: span.end,
            });
        });
    }
    raw
}

/// Runs `find` over every unclaimed segment and reports each hit through
/// `on_claim`. `find` returns absolute offsets inside the segment it is given.
/// Returns the segments still unclaimed.
fn claim<F, C>(raw: Vec<Range<usize>>, find: F, mut on_claim: C) -> Vec<Range<usize>>
where
    F: Fn(Range<usize>) -> Vec<Range<usize>>,
    C: FnMut(Range<usize>),
{
    let mut remaining = Vec::with_capacity(raw.len());
    for segment in raw {
        let mut cursor = segment.start;
        for span in find(segment.clone()) {
            if span.is_empty() || span.start < cursor || span.end > segment.end {
                continue;
            }
            if cursor < span.start {
                remaining.push(cursor..span.start);
            }
            cursor = span.end;
            on_claim(span);
        }
        if cursor < segment.end {
            remaining.push(cursor..segment.end);
        }
    }
    remaining
}
