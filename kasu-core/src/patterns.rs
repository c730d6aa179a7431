// kasu-core/src/patterns.rs
//! Gitignore-compatible pattern compilation and evaluation.
//!
//! A [`PatternSet`] is an ordered list of [`IgnoreRule`]s. Each rule body is
//! compiled once into a `globset` matcher with `*` confined to one path
//! segment; evaluation walks every rule in
//! source order and the last matching rule decides (negations included). The
//! result is never cached per directory: a later `!rule` can re-include a path
//! below a directory an earlier rule ignored, so each path is evaluated on its
//! own.
//!
//! The same pattern language is used for include globs and exclude patterns,
//! where "ignored" simply reads as "matched".
//!
//! License: MIT OR APACHE 2.0

use std::fs;
use std::io;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use log::{debug, warn};

use crate::errors::{KasuError, Warning};

/// Patterns prepended when a root `.gitignore` is auto-detected.
pub const VCS_PATTERNS: &[&str] = &[
    ".git/",
    ".svn/",
    ".hg/",
    ".bzr/",
    ".gitignore",
    ".gitattributes",
    ".gitmodules",
];

/// A single compiled gitignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    /// The glob body with the `!`, leading `/` and trailing `/` markers removed.
    pub pattern: String,
    pub negated: bool,
    pub anchored: bool,
    pub directory_only: bool,
    /// Position of the rule within its [`PatternSet`].
    pub source_order: usize,
    /// Root-relative directory of the ignore file that declared the rule.
    pub base: String,
    matcher: GlobMatcher,
}

impl IgnoreRule {
    /// Parses one raw pattern-file line.
    ///
    /// Returns `Ok(None)` for blank lines and comments.
    pub fn parse(
        raw: &str,
        line_number: usize,
        base: &str,
        source_order: usize,
    ) -> Result<Option<IgnoreRule>, KasuError> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let syntax_error = |reason: &str| KasuError::PatternSyntax {
            line: line_number,
            pattern: line.to_string(),
            reason: reason.to_string(),
        };

        // `\!` and `\#` keep their backslash here; glob translation unescapes them.
        let (negated, mut body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let directory_only = body.ends_with('/');
        body = body.trim_end_matches('/');

        let mut anchored = false;
        if let Some(rest) = body.strip_prefix('/') {
            anchored = true;
            body = rest;
        }
        if body.is_empty() {
            return Err(syntax_error("empty pattern"));
        }
        anchored |= body.contains('/');

        // Unanchored rules match at any depth below their base.
        let glob = if anchored {
            body.to_string()
        } else {
            format!("**/{}", body)
        };
        let matcher = build_matcher(&glob).map_err(|e| syntax_error(&e.kind().to_string()))?;

        debug!(
            "Compiled ignore rule #{} '{}' (negated={}, anchored={}, dir_only={}, base='{}') as '{}'",
            source_order, line, negated, anchored, directory_only, base, glob
        );

        Ok(Some(IgnoreRule {
            pattern: body.to_string(),
            negated,
            anchored,
            directory_only,
            source_order,
            base: base.to_string(),
            matcher,
        }))
    }

    /// Strips the rule's base from a root-relative path.
    fn relative_to_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base.is_empty() {
            return Some(path);
        }
        path.strip_prefix(self.base.as_str())?.strip_prefix('/')
    }

    fn matches_exact(&self, rel: &str, is_dir: bool) -> bool {
        (is_dir || !self.directory_only) && self.matcher.is_match(rel)
    }

    /// True if the rule matches the path itself or any directory above it.
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        let Some(rel) = self.relative_to_base(path) else {
            return false;
        };
        if self.matches_exact(rel, is_dir) {
            return true;
        }
        rel.match_indices('/')
            .any(|(idx, _)| self.matches_exact(&rel[..idx], true))
    }

    /// True if this negation reaches into `dir` through an anchored prefix.
    ///
    /// Unanchored rules (and rules starting with `**`) never count: as in git,
    /// a pattern that merely matches by name cannot re-include a path whose
    /// parent directory is excluded.
    fn could_match_below(&self, dir: &str) -> bool {
        if !self.anchored {
            return false;
        }
        let reldir = if self.base.is_empty() {
            dir
        } else if dir == self.base {
            ""
        } else {
            match dir
                .strip_prefix(self.base.as_str())
                .and_then(|d| d.strip_prefix('/'))
            {
                Some(d) => d,
                None => return false,
            }
        };
        if reldir.is_empty() {
            return true;
        }

        let pattern_segments: Vec<&str> = self.pattern.split('/').collect();
        let dir_segments: Vec<&str> = reldir.split('/').collect();
        for (i, dir_segment) in dir_segments.iter().enumerate() {
            let Some(pattern_segment) = pattern_segments.get(i) else {
                // The rule stops at or above `dir`, so it already applied to `dir` itself.
                return false;
            };
            if pattern_segment.contains("**") {
                return i > 0;
            }
            let segment_matches = build_matcher(pattern_segment)
                .map_or(true, |m| m.is_match(dir_segment));
            if !segment_matches {
                return false;
            }
        }
        pattern_segments.len() > dir_segments.len()
    }
}

/// An ordered list of gitignore rules, evaluated last-match-wins.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<IgnoreRule>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles root-level pattern lines. Malformed lines are skipped and returned as warnings.
    pub fn compile<I, S>(lines: I) -> (Self, Vec<Warning>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::compile_with_base(lines, "")
    }

    /// Compiles pattern lines declared by an ignore file living in `base`.
    pub fn compile_with_base<I, S>(lines: I, base: &str) -> (Self, Vec<Warning>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = PatternSet::new();
        let mut warnings = Vec::new();

        for (idx, raw) in lines.into_iter().enumerate() {
            match IgnoreRule::parse(raw.as_ref(), idx + 1, base, set.rules.len()) {
                Ok(Some(rule)) => set.rules.push(rule),
                Ok(None) => {}
                Err(e) => {
                    warn!("{}", e);
                    warnings.push(Warning::from(e));
                }
            }
        }

        debug!(
            "Compiled {} ignore rule(s) for base '{}' ({} skipped).",
            set.rules.len(),
            base,
            warnings.len()
        );
        (set, warnings)
    }

    /// Returns a new set holding `self`'s rules followed by `local`'s.
    pub fn concat(&self, local: &PatternSet) -> PatternSet {
        let mut combined = self.clone();
        combined.append(local);
        combined
    }

    /// Appends `other`'s rules after this set's, renumbering their source order.
    pub fn append(&mut self, other: &PatternSet) {
        let offset = self.rules.len();
        self.rules.extend(other.rules.iter().cloned().map(|mut rule| {
            rule.source_order += offset;
            rule
        }));
    }

    /// The last rule matching the path, if any.
    pub fn matched_rule(&self, path: &str, is_dir: bool) -> Option<&IgnoreRule> {
        self.rules.iter().rev().find(|rule| rule.matches(path, is_dir))
    }

    /// Evaluates a root-relative, `/`-separated path.
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        self.matched_rule(path, is_dir)
            .map_or(false, |rule| !rule.negated)
    }

    /// True if a negation rule could re-include a path below the ignored directory `dir`.
    pub fn may_reinclude_under(&self, dir: &str) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.negated)
            .any(|rule| rule.could_match_below(dir))
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Reads an ignore file into raw lines.
pub fn read_pattern_lines(path: &Path) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Compiles a glob with gitignore wildcard rules: `*` and `?` stay within
/// one path segment and a backslash escapes the next character.
fn build_matcher(glob: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(lines: &[&str]) -> PatternSet {
        let (set, warnings) = PatternSet::compile(lines.iter().copied());
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        set
    }

    #[test]
    fn test_negation_last_match_wins() {
        let s = set(&["*.log", "!important.log"]);
        assert!(s.is_ignored("build.log", false));
        assert!(!s.is_ignored("important.log", false));
        assert!(!s.is_ignored("nested/important.log", false));
        assert!(s.is_ignored("nested/build.log", false));
    }

    #[test]
    fn test_later_rule_reignores() {
        let s = set(&["*.log", "!important.log", "important.log"]);
        assert!(s.is_ignored("important.log", false));
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let s = set(&["# comment", "", "   ", "*.tmp"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.rules()[0].source_order, 0);
    }

    #[test]
    fn test_escaped_hash_and_bang_are_literal() {
        let s = set(&["\\#notes.txt", "\\!bang.txt"]);
        assert!(s.is_ignored("#notes.txt", false));
        assert!(s.is_ignored("!bang.txt", false));
        assert!(s.rules().iter().all(|r| !r.negated));
    }

    #[test]
    fn test_directory_only_rule() {
        let s = set(&["build/"]);
        assert!(s.is_ignored("build", true));
        assert!(!s.is_ignored("build", false));
        assert!(s.is_ignored("build/out.o", false));
        assert!(s.is_ignored("src/build/out.o", false));
    }

    #[test]
    fn test_leading_slash_anchors_to_root() {
        let s = set(&["/build"]);
        assert!(s.is_ignored("build", true));
        assert!(!s.is_ignored("src/build", true));
    }

    #[test]
    fn test_internal_slash_anchors() {
        let s = set(&["doc/frotz"]);
        assert!(s.is_ignored("doc/frotz", false));
        assert!(!s.is_ignored("a/doc/frotz", false));
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let s = set(&["src/*.py"]);
        assert!(s.is_ignored("src/main.py", false));
        assert!(!s.is_ignored("src/utils/helper.py", false));
    }

    #[test]
    fn test_double_star_forms() {
        let s = set(&["**/test"]);
        assert!(s.is_ignored("test", true));
        assert!(s.is_ignored("src/test", true));

        let s = set(&["src/**/*.py"]);
        assert!(s.is_ignored("src/main.py", false));
        assert!(s.is_ignored("src/a/b/deep.py", false));
        assert!(!s.is_ignored("test.py", false));

        let s = set(&["logs/**"]);
        assert!(s.is_ignored("logs/a/b.txt", false));
        assert!(!s.is_ignored("other/b.txt", false));
    }

    #[test]
    fn test_question_mark_and_classes() {
        let s = set(&["file?.txt", "[!a]*.md", "data[0-9].csv"]);
        assert!(s.is_ignored("file1.txt", false));
        assert!(!s.is_ignored("file10.txt", false));
        assert!(s.is_ignored("readme.md", false));
        assert!(!s.is_ignored("about.md", false));
        assert!(s.is_ignored("data7.csv", false));
        assert!(!s.is_ignored("datax.csv", false));
    }

    #[test]
    fn test_case_sensitive() {
        let s = set(&["*.PY"]);
        assert!(s.is_ignored("TEST.PY", false));
        assert!(!s.is_ignored("test.py", false));
    }

    #[test]
    fn test_malformed_lines_warn_and_continue() {
        let (s, warnings) = PatternSet::compile(["[abc", "*.log", "trailing\\", "!"]);
        assert_eq!(s.len(), 1);
        assert_eq!(warnings.len(), 3);
        assert!(matches!(
            warnings[0].error(),
            KasuError::PatternSyntax { line: 1, .. }
        ));
        assert!(s.is_ignored("x.log", false));
    }

    #[test]
    fn test_base_scoping() {
        let (local, _) = PatternSet::compile_with_base(["*.gen", "/only-here"], "pkg");
        let combined = set(&["*.log"]).concat(&local);
        assert!(combined.is_ignored("pkg/a.gen", false));
        assert!(combined.is_ignored("pkg/sub/a.gen", false));
        assert!(!combined.is_ignored("other/a.gen", false));
        assert!(combined.is_ignored("pkg/only-here", false));
        assert!(!combined.is_ignored("pkg/sub/only-here", false));
        assert_eq!(combined.rules()[2].source_order, 2);
    }

    #[test]
    fn test_may_reinclude_under() {
        let s = set(&["build/", "!build/keep.txt"]);
        assert!(s.may_reinclude_under("build"));
        assert!(!s.may_reinclude_under("other"));

        let s = set(&["node_modules/"]);
        assert!(!s.may_reinclude_under("node_modules"));

        let s = set(&["vendor/", "!important.log"]);
        assert!(!s.may_reinclude_under("vendor"));

        let s = set(&["vendor/", "!**/important.log", "!vendor/**/keep.txt"]);
        assert!(s.may_reinclude_under("vendor"));
        assert!(s.may_reinclude_under("vendor/lib"));
        assert!(!s.may_reinclude_under("other"));
    }
}
