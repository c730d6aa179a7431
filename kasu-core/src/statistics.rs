// kasu-core/src/statistics.rs
//! Size, line and extension statistics over a selection.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;
use std::path::Path;

use log::warn;
use serde::Serialize;

use crate::selector::FileRecord;

pub const NO_EXTENSION: &str = "(no extension)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub extension: String,
    pub count: usize,
    pub size: u64,
    pub lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStatistics {
    pub total_files: usize,
    pub total_size: u64,
    /// Lines across text files only.
    pub total_lines: usize,
    /// Sorted by count descending, then extension.
    pub by_extension: Vec<ExtensionStats>,
}

impl FileStatistics {
    /// Reads every text record once to count its lines.
    pub fn calculate(records: &[FileRecord]) -> Self {
        let mut stats = FileStatistics::default();
        let mut by_ext: HashMap<String, ExtensionStats> = HashMap::new();

        for record in records {
            let lines = if record.is_text {
                count_lines(&record.absolute_path)
            } else {
                0
            };
            stats.total_files += 1;
            stats.total_size += record.size;
            stats.total_lines += lines;

            let ext = extension_of(&record.relative_path);
            let entry = by_ext.entry(ext.clone()).or_insert_with(|| ExtensionStats {
                extension: ext,
                ..ExtensionStats::default()
            });
            entry.count += 1;
            entry.size += record.size;
            entry.lines += lines;
        }

        stats.by_extension = by_ext.into_values().collect();
        stats
            .by_extension
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.extension.cmp(&b.extension)));
        stats
    }
}

/// `.rs` for `src/lib.rs`; dotfiles such as `.gitignore` have no extension.
fn extension_of(relative_path: &str) -> String {
    Path::new(relative_path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

fn count_lines(path: &Path) -> usize {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).lines().count(),
        Err(e) => {
            warn!("Could not count lines in {}: {}", path.display(), e);
            0
        }
    }
}

/// Renders a byte count as `512 B`, `1.5 KB`, `3.0 MB` and so on.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    for unit in &UNITS[..UNITS.len() - 1] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} {}", size, UNITS[UNITS.len() - 1])
}
