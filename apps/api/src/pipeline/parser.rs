//! Response parsing — pulls two independent things out of the raw generated
//! text: the human-readable display document and the recommendation tokens.
//!
//! Tokens come preferentially from an embedded machine-readable payload (a
//! `recommended_courses` array, fenced or trailing-bare); when that is absent
//! or unparseable the parser degrades to scanning the "Recommended Courses"
//! heading section. An empty token list is a recorded degradation, never an
//! error — downstream treats it as "no matches possible".

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::section;

fn fenced_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap())
}

fn trailing_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\n?(\{.*\})\s*\z").unwrap())
}

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// The generated text with any trailing machine-readable block stripped —
    /// this is what gets persisted.
    pub display_text: String,
    /// Free-text course identifiers, not yet validated against the catalog.
    pub recommendations: Vec<String>,
}

pub fn parse_response(raw: &str) -> ParsedResponse {
    let display_text = strip_machine_blocks(raw);
    let recommendations = extract_recommendations(raw, &display_text);
    if recommendations.is_empty() {
        warn!("No recommended courses found in response; matching will be skipped");
    } else {
        debug!("Extracted {} recommendation tokens", recommendations.len());
    }
    ParsedResponse {
        display_text,
        recommendations,
    }
}

/// Removes fenced ```json blocks and a trailing bare `{...}` payload.
fn strip_machine_blocks(raw: &str) -> String {
    let without_fences = fenced_json_re().replace_all(raw, "");
    trailing_json_re().replace(&without_fences, "").into_owned()
}

fn extract_recommendations(raw: &str, display_text: &str) -> Vec<String> {
    if let Some(tokens) = payload_recommendations(raw) {
        return tokens;
    }
    heading_recommendations(display_text)
}

/// Embedded-payload path: a fenced ```json block, else a trailing bare
/// object, containing a `recommended_courses` array.
fn payload_recommendations(raw: &str) -> Option<Vec<String>> {
    let payload = fenced_json_re()
        .captures(raw)
        .or_else(|| trailing_json_re().captures(raw))
        .map(|c| c[1].to_string())?;

    let parsed: serde_json::Value = serde_json::from_str(&payload).ok()?;
    let courses = parsed.get("recommended_courses")?.as_array()?;

    let tokens: Vec<String> = courses
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

/// Heading-fallback path: bullet/numbered lines under "Recommended Courses",
/// truncated at the first `" - "` (text after a dash is descriptive, not part
/// of the identifying name).
fn heading_recommendations(display_text: &str) -> Vec<String> {
    let lines: Vec<&str> = display_text.lines().collect();
    let Some(span) = section::find_section(&lines) else {
        return Vec::new();
    };

    section::section_item_lines(&lines, &span)
        .into_iter()
        .map(|line| match line.split_once(" - ") {
            Some((name, _)) => name.trim().to_string(),
            None => line,
        })
        .filter(|line| !line.is_empty())
        .collect()
}
