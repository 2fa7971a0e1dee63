//! Document annotation — rewrites the persisted display document to inline
//! matched course codes. Two independent passes, each deriving a fresh
//! document from the ORIGINAL display text; derivatives never feed back into
//! later stages.
//!
//! Pass A rewrites the "Recommended Courses" section wholesale: every line
//! becomes a `- {text} ({code})` bullet when its text exactly matches a
//! reconciled recommendation, else a bare `- {text}` bullet.
//!
//! Pass B is the robustness pass: substring-based, append-only, and
//! idempotent — re-running it on its own output is a no-op. When the
//! pipeline's match list is empty it re-derives one from the saved document
//! and the catalog.

use crate::catalog::CatalogStore;
use crate::pipeline::matcher::{match_courses, CourseMatch};
use crate::pipeline::section;

/// Pass A: wholesale section rewrite against exact recommendation text.
pub fn annotate_section_rewrite(display_text: &str, matches: &[CourseMatch]) -> String {
    let lines: Vec<&str> = display_text.lines().collect();
    let Some(span) = section::find_section(&lines) else {
        return display_text.to_string();
    };

    let mut out: Vec<String> = lines[..=span.heading].iter().map(|s| s.to_string()).collect();
    out.push(String::new());

    for line in &lines[span.body.clone()] {
        if line.trim().is_empty() {
            continue;
        }
        let text = section::strip_list_marker(line);
        match find_code_for_exact(&text, matches) {
            Some(code) => out.push(format!("- {text} ({code})")),
            None => out.push(format!("- {text}")),
        }
    }

    out.push(String::new());
    out.extend(lines[span.body.end..].iter().map(|s| s.to_string()));
    out.join("\n")
}

/// Pass B: line-by-line substring append. `matches` is the pipeline's result;
/// when it is empty the mapping is recomputed from the document itself.
pub fn annotate_inline_append(
    display_text: &str,
    matches: &[CourseMatch],
    catalog: &CatalogStore,
) -> String {
    let lines: Vec<&str> = display_text.lines().collect();
    let Some(span) = section::find_section(&lines) else {
        return display_text.to_string();
    };

    let recomputed;
    let mapping: &[CourseMatch] = if matches.is_empty() {
        let rec_lines = section::section_item_lines(&lines, &span);
        recomputed = match_courses(&rec_lines, catalog);
        &recomputed
    } else {
        matches
    };

    let mut out: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
    for i in span.body.clone() {
        let line = out[i].clone();
        if !section::is_list_line(&line) {
            continue;
        }
        let line_lower = line.to_lowercase();
        for m in mapping {
            let Some(code) = m.matched_code.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            if m.recommendation.is_empty() {
                continue;
            }
            if line_lower.contains(&m.recommendation.to_lowercase()) {
                if !line.contains(code) {
                    out[i] = format!("{} ({code})", line.trim_end());
                }
                break;
            }
        }
    }

    out.join("\n")
}

fn find_code_for_exact<'a>(text: &str, matches: &'a [CourseMatch]) -> Option<&'a str> {
    matches
        .iter()
        .find(|m| m.recommendation == text)
        .and_then(|m| m.matched_code.as_deref())
        .filter(|code| !code.is_empty())
}
