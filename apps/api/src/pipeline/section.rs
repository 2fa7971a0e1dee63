//! "Recommended Courses" section extraction, shared by the response parser's
//! heading fallback and both annotation passes.
//!
//! Scanning is an explicit state machine over lines:
//! `BeforeSection` → (heading match) → `InSection` → (next heading or
//! horizontal rule) → `AfterSection`.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn section_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^#+\s*Recommended Courses").unwrap())
}

fn any_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s").unwrap())
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*\d.)]+\s*").unwrap())
}

fn list_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([*\-]|\d+\.)").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    BeforeSection,
    InSection,
    AfterSection,
}

/// Line span of the section body (heading excluded, terminator excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub heading: usize,
    pub body: Range<usize>,
}

/// True for a heading whose text starts with "Recommended Courses", any level.
pub fn is_section_heading(line: &str) -> bool {
    section_heading_re().is_match(line)
}

fn is_any_heading(line: &str) -> bool {
    any_heading_re().is_match(line)
}

fn is_rule(line: &str) -> bool {
    line.trim_start().starts_with("---")
}

/// True for bullet (`-`, `*`) or numbered (`1.`) lines.
pub fn is_list_line(line: &str) -> bool {
    list_line_re().is_match(line)
}

/// Strips a leading list marker or numbering, e.g. `"3. Foo"` → `"Foo"`.
pub fn strip_list_marker(line: &str) -> String {
    list_marker_re().replace(line, "").trim().to_string()
}

/// Locates the "Recommended Courses" section. The body runs from the line
/// after the heading up to (exclusive) the next heading or horizontal rule,
/// or the end of the document.
pub fn find_section(lines: &[&str]) -> Option<SectionSpan> {
    let mut state = SectionState::BeforeSection;
    let mut heading = 0usize;
    let mut body_end = lines.len();

    for (i, line) in lines.iter().enumerate() {
        match state {
            SectionState::BeforeSection => {
                if is_section_heading(line) {
                    heading = i;
                    state = SectionState::InSection;
                }
            }
            SectionState::InSection => {
                if is_any_heading(line) || is_rule(line) {
                    body_end = i;
                    state = SectionState::AfterSection;
                }
            }
            SectionState::AfterSection => break,
        }
    }

    match state {
        SectionState::BeforeSection => None,
        _ => Some(SectionSpan {
            heading,
            body: heading + 1..body_end,
        }),
    }
}

/// Non-empty body lines with list markers stripped, in document order.
pub fn section_item_lines(lines: &[&str], span: &SectionSpan) -> Vec<String> {
    lines[span.body.clone()]
        .iter()
        .filter(|ln| !ln.trim().is_empty())
        .map(|ln| strip_list_marker(ln))
        .filter(|ln| !ln.is_empty())
        .collect()
}
