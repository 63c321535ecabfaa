//! Outcome classification for probe calls.
//!
//! Best-effort: upstream error text is not a stable contract, so matching is a
//! small ordered table of `(needle, status)` pairs checked case-insensitively.
//! The first matching rule wins; a failure matching nothing is `OtherError`.

use super::ProbeStatus;

/// One substring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Matched case-insensitively against the error text.
    pub needle: String,
    pub status: ProbeStatus,
}

impl ClassificationRule {
    pub fn new(needle: impl Into<String>, status: ProbeStatus) -> Self {
        Self {
            needle: needle.into().to_lowercase(),
            status,
        }
    }
}

/// Not-found rules come before permission rules, so a 404 that also talks
/// about permissions is still `NotFound`.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new("404", ProbeStatus::NotFound),
        ClassificationRule::new("not found", ProbeStatus::NotFound),
        ClassificationRule::new("permission", ProbeStatus::PermissionDenied),
        ClassificationRule::new("forbidden", ProbeStatus::PermissionDenied),
    ]
}

/// Status for a failed call.
pub fn classify_error(message: &str, rules: &[ClassificationRule]) -> ProbeStatus {
    let haystack = message.to_lowercase();
    rules
        .iter()
        .find(|r| haystack.contains(r.needle.as_str()))
        .map(|r| r.status)
        .unwrap_or(ProbeStatus::OtherError)
}

/// Status for a successful call.
pub fn classify_response(text: Option<&str>) -> ProbeStatus {
    match text {
        Some(t) if !t.trim().is_empty() => ProbeStatus::Available,
        _ => ProbeStatus::EmptyResponse,
    }
}

/// First line of `message`, cut to `max_chars` characters with a `...` marker.
pub fn truncate_detail(message: &str, max_chars: usize) -> String {
    let first_line = message.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_chars {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
