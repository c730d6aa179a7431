// kasu-core/src/logging.rs
//! PII-aware debug logging helpers.
//!
//! Matched sensitive values must never land in a log file by accident. Every
//! debug line that mentions a matched value goes through [`loggable`], which
//! masks the value unless `KASU_ALLOW_DEBUG_PII=true` is set for the process.

use log::debug;
use once_cell::sync::Lazy;

/// Read once; flipping the variable mid-run has no effect.
static PII_DEBUG_ALLOWED: Lazy<bool> = Lazy::new(|| {
    std::env::var("KASU_ALLOW_DEBUG_PII")
        .map(|s| s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// Masks a sensitive value, keeping only its length for longer inputs.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

/// Returns the value itself when PII debugging is allowed, a mask otherwise.
pub fn loggable(sensitive: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive.to_string()
    } else {
        redact_sensitive(sensitive)
    }
}

pub fn log_detection_debug(label: &str, matched: &str, start: usize, end: usize) {
    debug!(
        "Detected {} at {}..{}: '{}'",
        label,
        start,
        end,
        loggable(matched)
    );
}

pub fn log_replacement_debug(label: &str, matched: &str, placeholder: &str) {
    debug!(
        "Redaction action: Original='{}', Redacted='{}' for category '{}'",
        loggable(matched),
        placeholder,
        label
    );
}
