// kasu-core/src/context.rs
//! Run-scoped redaction state.
//!
//! A [`RunContext`] is created by the caller at the start of one invocation
//! and passed to every sanitize call of that invocation. It owns the custom
//! rules and the per-category value-to-index maps, so the same value always
//! maps to the same placeholder within a run and separate runs never share
//! numbering.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detectors::Category;
use crate::engine::Scan;
use crate::logging::log_replacement_debug;
use crate::replacements::CustomReplacementRule;

/// Per-label counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionSummaryItem {
    pub label: String,
    pub occurrences: usize,
    pub distinct_values: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunContext {
    rules: Vec<CustomReplacementRule>,
    indices: HashMap<Category, HashMap<String, usize>>,
    occurrences: HashMap<Category, usize>,
    custom_hits: Vec<usize>,
}

impl RunContext {
    pub fn new(rules: Vec<CustomReplacementRule>) -> Self {
        let custom_hits = vec![0; rules.len()];
        Self {
            rules,
            custom_hits,
            ..Self::default()
        }
    }

    pub fn rules(&self) -> &[CustomReplacementRule] {
        &self.rules
    }

    /// Index already assigned to `value`, if it was seen in this run.
    pub fn index_of(&self, category: Category, value: &str) -> Option<usize> {
        self.indices.get(&category).and_then(|m| m.get(value)).copied()
    }

    /// Returns the value's index, assigning the next free one on first sight.
    fn assign(&mut self, category: Category, value: &str) -> usize {
        let map = self.indices.entry(category).or_default();
        let next = map.len() + 1;
        *map.entry(value.to_string()).or_insert(next)
    }

    /// Rewrites `text` using a scan produced for exactly this text.
    ///
    /// Indices are assigned in scan order, so calls must happen in the
    /// order the inputs are meant to be numbered.
    pub fn apply(&mut self, text: &str, scan: &Scan) -> String {
        let mut edits: Vec<(usize, usize, String)> =
            Vec::with_capacity(scan.custom_spans().len() + scan.detections().len());

        for span in scan.custom_spans() {
            let Some(rule) = self.rules.get(span.rule_index) else {
                continue;
            };
            edits.push((span.start, span.end, rule.to.clone()));
            self.custom_hits[span.rule_index] += 1;
        }

        for detection in scan.detections() {
            let index = self.assign(detection.category, &detection.value);
            *self.occurrences.entry(detection.category).or_insert(0) += 1;
            let placeholder = detection.category.placeholder(index);
            log_replacement_debug(detection.category.label(), &detection.value, &placeholder);
            edits.push((detection.start, detection.end, placeholder));
        }

        edits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(text.len());
        let mut last_end = 0;
        for (start, end, replacement) in edits {
            if start < last_end {
                continue;
            }
            out.push_str(&text[last_end..start]);
            out.push_str(&replacement);
            last_end = end;
        }
        out.push_str(&text[last_end..]);
        out
    }

    /// Categories that fired, in reporting order, then custom rules that fired.
    pub fn summary(&self) -> Vec<RedactionSummaryItem> {
        let mut items: Vec<RedactionSummaryItem> = Category::ALL
            .iter()
            .filter_map(|category| {
                let occurrences = self.occurrences.get(category).copied().unwrap_or(0);
                (occurrences > 0).then(|| RedactionSummaryItem {
                    label: category.label().to_string(),
                    occurrences,
                    distinct_values: self.indices.get(category).map_or(0, HashMap::len),
                })
            })
            .collect();

        items.extend(
            self.rules
                .iter()
                .zip(&self.custom_hits)
                .filter(|(_, hits)| **hits > 0)
                .map(|(rule, hits)| RedactionSummaryItem {
                    label: format!("Custom: {}", rule.from),
                    occurrences: *hits,
                    distinct_values: 1,
                }),
        );
        items
    }
}
