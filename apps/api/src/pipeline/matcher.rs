//! Course matching — reconciles each free-text recommendation to a catalog
//! record through three tiers, stopping at the first hit:
//!
//! 1. exact: case-insensitive equality with a record's display key;
//! 2. substring: either string contains the other, first record in catalog
//!    order wins;
//! 3. fuzzy: sequence-similarity ratio over word-order-normalized text,
//!    best candidate wins at ratio ≥ 0.6, ties broken by catalog order.
//!
//! A token no tier resolves yields a match with null code/title — not an
//! error. Output always pairs 1:1 with the input token list.

use serde::Serialize;
use similar::TextDiff;
use tracing::debug;

use crate::catalog::{CatalogStore, CourseRecord};

const FUZZY_THRESHOLD: f32 = 0.6;

/// One reconciled recommendation. `matched_code` is `None` when no tier
/// produced a hit (or the hit record carries no code).
#[derive(Debug, Clone, Serialize)]
pub struct CourseMatch {
    pub recommendation: String,
    pub matched_code: Option<String>,
    pub matched_title: Option<String>,
}

/// Matches every token against the catalog. Deterministic given identical
/// catalog ordering and token list.
pub fn match_courses(tokens: &[String], catalog: &CatalogStore) -> Vec<CourseMatch> {
    // Candidate list preserves catalog iteration order for tie-breaks
    let candidates: Vec<(&CourseRecord, String)> = catalog
        .records()
        .iter()
        .filter_map(|r| r.display_key().map(|k| (r, k.to_lowercase())))
        .collect();

    let matches: Vec<CourseMatch> = tokens
        .iter()
        .map(|token| {
            let found = find_match(token, &candidates);
            CourseMatch {
                recommendation: token.clone(),
                matched_code: found.and_then(|r| r.code()).map(str::to_string),
                matched_title: found.and_then(|r| r.matched_title()).map(str::to_string),
            }
        })
        .collect();

    debug!(
        "Matched {}/{} recommendations to catalog records",
        matches.iter().filter(|m| m.matched_code.is_some()).count(),
        matches.len()
    );
    matches
}

fn find_match<'a>(
    token: &str,
    candidates: &[(&'a CourseRecord, String)],
) -> Option<&'a CourseRecord> {
    let token_lower = token.to_lowercase();

    // Tier 1: exact
    if let Some((record, _)) = candidates.iter().find(|(_, key)| *key == token_lower) {
        return Some(record);
    }

    // Tier 2: substring, first candidate in catalog order wins
    if let Some((record, _)) = candidates
        .iter()
        .find(|(_, key)| token_lower.contains(key.as_str()) || key.contains(&token_lower))
    {
        return Some(record);
    }

    // Tier 3: fuzzy, single best candidate at or above threshold
    let normalized_token = normalize_for_ratio(token);
    let mut best: Option<(&CourseRecord, f32)> = None;
    for (record, key) in candidates {
        let ratio = similarity_ratio(&normalized_token, &normalize_for_ratio(key));
        let improves = match best {
            Some((_, best_ratio)) => ratio > best_ratio,
            None => true,
        };
        if ratio >= FUZZY_THRESHOLD && improves {
            best = Some((record, ratio));
        }
    }
    best.map(|(record, _)| record)
}

/// Lowercases and sorts words so reorderings like "Robotics Intro" vs
/// "Intro to Robotics" still score as near-identical sequences.
fn normalize_for_ratio(text: &str) -> String {
    let mut words: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    words.sort();
    words.join(" ")
}

fn similarity_ratio(a: &str, b: &str) -> f32 {
    TextDiff::from_chars(a, b).ratio()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> CatalogStore {
        CatalogStore::from_value(json!([
            {"title": "Intro to Robotics", "course_code": "14:440:127"},
            {"title": "Data Structures", "course_code": "01:198:112"},
            {"title": "Linear Algebra", "course_code": "01:640:250"}
        ]))
    }

    fn single(token: &str) -> CourseMatch {
        match_courses(&[token.to_string()], &catalog()).remove(0)
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let m = single("intro to robotics");
        assert_eq!(m.matched_code.as_deref(), Some("14:440:127"));
        assert_eq!(m.matched_title.as_deref(), Some("Intro to Robotics"));
    }

    #[test]
    fn test_exact_scenario_from_catalog_of_one() {
        let catalog = CatalogStore::from_value(json!([
            {"title": "Intro to Robotics", "course_code": "14:440:127"}
        ]));
        let matches = match_courses(&["Intro to Robotics".to_string()], &catalog);
        assert_eq!(matches[0].matched_code.as_deref(), Some("14:440:127"));
    }

    #[test]
    fn test_substring_match_token_in_key() {
        let m = single("Robotics");
        assert_eq!(m.matched_code.as_deref(), Some("14:440:127"));
    }

    #[test]
    fn test_substring_match_key_in_token() {
        let m = single("Advanced Data Structures and Algorithms");
        assert_eq!(m.matched_code.as_deref(), Some("01:198:112"));
    }

    #[test]
    fn test_substring_first_candidate_wins() {
        let catalog = CatalogStore::from_value(json!([
            {"title": "Algebra I", "course_code": "A1"},
            {"title": "Algebra II", "course_code": "A2"}
        ]));
        let matches = match_courses(&["Algebra".to_string()], &catalog);
        assert_eq!(matches[0].matched_code.as_deref(), Some("A1"));
    }

    #[test]
    fn test_fuzzy_matches_reordered_title() {
        let m = single("Robotics Intro");
        assert_eq!(m.matched_code.as_deref(), Some("14:440:127"));
    }

    #[test]
    fn test_fuzzy_threshold_is_inclusive() {
        // normalized ratio("abcde", "abcxy") = 2*3/10 = 0.6 exactly
        let catalog = CatalogStore::from_value(json!([
            {"title": "abcxy", "course_code": "C1"}
        ]));
        let matches = match_courses(&["abcde".to_string()], &catalog);
        assert_eq!(matches[0].matched_code.as_deref(), Some("C1"));
    }

    #[test]
    fn test_fuzzy_below_threshold_yields_no_match() {
        // ratio("abcde", "abfgh") = 2*2/10 = 0.4
        let catalog = CatalogStore::from_value(json!([
            {"title": "abfgh", "course_code": "C1"}
        ]));
        let matches = match_courses(&["abcde".to_string()], &catalog);
        assert!(matches[0].matched_code.is_none());
        assert!(matches[0].matched_title.is_none());
    }

    #[test]
    fn test_exact_tier_beats_fuzzy_candidates() {
        let catalog = CatalogStore::from_value(json!([
            {"title": "Linear Algebra II", "course_code": "FUZZY"},
            {"title": "Linear Algebra", "course_code": "EXACT"}
        ]));
        let matches = match_courses(&["Linear Algebra".to_string()], &catalog);
        assert_eq!(matches[0].matched_code.as_deref(), Some("EXACT"));
    }

    #[test]
    fn test_output_length_equals_input_length() {
        let tokens = vec![
            "Intro to Robotics".to_string(),
            "No Such Course Anywhere".to_string(),
            "Data Structures".to_string(),
        ];
        let matches = match_courses(&tokens, &catalog());
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[1].recommendation, "No Such Course Anywhere");
    }

    #[test]
    fn test_empty_tokens_empty_output() {
        assert!(match_courses(&[], &catalog()).is_empty());
    }

    #[test]
    fn test_display_key_fallback_to_code_for_untitled_records() {
        let catalog = CatalogStore::from_value(json!([
            {"course_code": "14:332:221"}
        ]));
        let matches = match_courses(&["14:332:221".to_string()], &catalog);
        assert_eq!(matches[0].matched_code.as_deref(), Some("14:332:221"));
        assert!(matches[0].matched_title.is_none());
    }

    #[test]
    fn test_matching_is_deterministic() {
        let tokens = vec!["Robotics Intro".to_string()];
        let first = match_courses(&tokens, &catalog());
        let second = match_courses(&tokens, &catalog());
        assert_eq!(first[0].matched_code, second[0].matched_code);
    }
}
