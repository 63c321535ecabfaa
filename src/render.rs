//! Plain-text rendering for the CLI: framed panels, the probe table and the
//! closing summary. Everything returns a `String`; printing is up to the caller.

use crate::config::ENV_MODEL;
use crate::probe::recommend::RecommendationSource;
use crate::probe::{ProbeOutcome, ProbeReport};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MODEL_COL_MAX: usize = 44;
const NOTE_COL_MAX: usize = 48;

/// Terminal columns, so wide CJK glyphs count twice.
fn width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn pad(s: &str, w: usize) -> String {
    let mut out = s.to_string();
    out.extend(std::iter::repeat(' ').take(w.saturating_sub(width(s))));
    out
}

/// Shorten to at most `max` columns, ending with `...` when cut.
pub fn clip(s: &str, max: usize) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// A box around `body`, with `title` in the top border.
///
/// ```text
/// +- Gemini ---------+
/// | Hello there.     |
/// +------------------+
/// ```
pub fn panel(title: &str, body: &str) -> String {
    let lines: Vec<&str> = if body.is_empty() {
        vec![""]
    } else {
        body.lines().collect()
    };
    let inner = lines
        .iter()
        .map(|l| width(l))
        .max()
        .unwrap_or(0)
        .max(width(title) + 2);

    let mut out = String::new();
    let head = if title.is_empty() {
        String::new()
    } else {
        format!(" {} ", title)
    };
    out.push_str(&format!(
        "+-{}{}+\n",
        head,
        "-".repeat(inner + 1 - width(&head).min(inner + 1))
    ));
    for l in lines {
        out.push_str(&format!("| {} |\n", pad(l, inner)));
    }
    out.push_str(&format!("+{}+\n", "-".repeat(inner + 2)));
    out
}

/// Results table: one row per outcome, in probe order.
pub fn probe_table(outcomes: &[ProbeOutcome]) -> String {
    let rows: Vec<(String, String, String)> = outcomes
        .iter()
        .map(|o| {
            (
                clip(&o.model, MODEL_COL_MAX),
                format!("{} {}", o.status.symbol(), o.status.label()),
                clip(&o.detail, NOTE_COL_MAX),
            )
        })
        .collect();

    let headers = ("Model", "Status", "Note");
    let w0 = rows.iter().map(|r| width(&r.0)).chain([width(headers.0)]).max().unwrap_or(0);
    let w1 = rows.iter().map(|r| width(&r.1)).chain([width(headers.1)]).max().unwrap_or(0);
    let w2 = rows.iter().map(|r| width(&r.2)).chain([width(headers.2)]).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "| {} | {} | {} |\n",
        pad(headers.0, w0),
        pad(headers.1, w1),
        pad(headers.2, w2)
    ));
    out.push_str(&format!(
        "|{}|{}|{}|\n",
        "-".repeat(w0 + 2),
        "-".repeat(w1 + 2),
        "-".repeat(w2 + 2)
    ));
    for (model, status, note) in &rows {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            pad(model, w0),
            pad(status, w1),
            pad(note, w2)
        ));
    }
    out
}

/// Count, recommendation and `.env` line; or the setup checklist when
/// nothing answered.
pub fn probe_summary(report: &ProbeReport) -> String {
    let mut out = String::new();
    if report.cancelled {
        out.push_str(&format!(
            "Interrupted after {} model(s).\n\n",
            report.outcomes.len()
        ));
    }

    let count = report.available_count();
    if count == 0 {
        out.push_str("No available models were found.\n\n");
        out.push_str("Check that:\n");
        out.push_str("  - the Vertex AI API is enabled for the project\n");
        out.push_str("  - GCP_PROJECT_ID names the right project\n");
        out.push_str("  - authentication is set up (GOOGLE_ACCESS_TOKEN or the OS keyring)\n");
        return out;
    }

    out.push_str(&format!("Available models: {}\n", count));
    if let Some(rec) = &report.recommendation {
        out.push_str("\nRecommended model:\n");
        match (&rec.source, &rec.note) {
            (RecommendationSource::Priority { .. }, Some(note)) => {
                out.push_str(&format!("  - {} ({})\n", rec.model, note));
            }
            _ => out.push_str(&format!("  - {}\n", rec.model)),
        }
        out.push_str("\nExample .env entry:\n");
        out.push_str(&format!("{}={}\n", ENV_MODEL, rec.model));
    }
    out
}
