//! Catalog filtering — narrows the catalog to records relevant to the
//! inferred major and builds the redacted course-name projection sent to the
//! generator.
//!
//! Two different inclusion tests run side by side:
//! - the STRICT test (major-ish fields, else title/description concat) picks
//!   the filtered record set, with a bounded head-of-catalog fallback so the
//!   next stage never starves;
//! - the LOOSE test (label anywhere in the combined fields) picks the
//!   projection/selection set, maximizing recall for the text the generator
//!   actually sees.

use tracing::info;

use crate::catalog::{CatalogStore, CourseRecord};

/// Head-of-catalog fallback size when strict filtering matches nothing.
const FALLBACK_LIMIT: usize = 100;

/// Output of the filter stage.
#[derive(Debug, Clone)]
pub struct FilteredCatalog {
    /// Strictly filtered records. Never empty while the catalog is non-empty.
    pub matched: Vec<CourseRecord>,
    /// Loosely matched records with instructor fields stripped; source of the
    /// projection lines and of the orchestrator's fallback digest.
    pub selected: Vec<CourseRecord>,
    /// One display name per selected record, newline-separated.
    pub projection: String,
}

pub fn filter_catalog(store: &CatalogStore, label: &str) -> FilteredCatalog {
    let needle = label.to_lowercase();

    let mut matched: Vec<CourseRecord> = store
        .records()
        .iter()
        .filter(|record| {
            record.major_text().contains(&needle) || record.text_blob().contains(&needle)
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        // Bounded default exposure rather than an empty result
        matched = store.records().iter().take(FALLBACK_LIMIT).cloned().collect();
    }

    let selected: Vec<CourseRecord> = store
        .records()
        .iter()
        .filter(|record| record.combined_text().contains(&needle))
        .map(CourseRecord::redacted)
        .collect();

    let mut lines: Vec<&str> = Vec::new();
    for record in &selected {
        if let Some(name) = record.display_key() {
            lines.push(name);
        }
    }
    let projection = lines.join("\n");

    info!(
        "Catalog filter for '{label}': {} strict matches, {} projection lines",
        matched.len(),
        lines.len()
    );

    FilteredCatalog {
        matched,
        selected,
        projection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(records: serde_json::Value) -> CatalogStore {
        CatalogStore::from_value(records)
    }

    #[test]
    fn test_strict_match_on_major_field() {
        let store = store(json!([
            {"major": "Electrical Engineering", "title": "Circuits"},
            {"major": "Art History", "title": "Baroque Painting"}
        ]));
        let filtered = filter_catalog(&store, "electrical");
        assert_eq!(filtered.matched.len(), 1);
        assert_eq!(filtered.matched[0].title.as_deref(), Some("Circuits"));
    }

    #[test]
    fn test_strict_match_falls_back_to_text_fields() {
        let store = store(json!([
            {"title": "Robotics Lab", "description": "hands-on electrical prototyping"}
        ]));
        let filtered = filter_catalog(&store, "electrical");
        assert_eq!(filtered.matched.len(), 1);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let store = store(json!([{"major": "Computer Science"}]));
        let filtered = filter_catalog(&store, "COMPUTER");
        assert_eq!(filtered.matched.len(), 1);
    }

    #[test]
    fn test_fallback_returns_head_of_catalog() {
        let records: Vec<_> = (0..150)
            .map(|i| json!({"major": "History", "title": format!("Course {i}")}))
            .collect();
        let store = store(json!(records));
        let filtered = filter_catalog(&store, "robotics");
        assert_eq!(filtered.matched.len(), 100);
        assert_eq!(filtered.matched[0].title.as_deref(), Some("Course 0"));
    }

    #[test]
    fn test_filtered_never_empty_for_nonempty_catalog() {
        let store = store(json!([{"major": "History"}]));
        let filtered = filter_catalog(&store, "no-such-major");
        assert!(!filtered.matched.is_empty());
    }

    #[test]
    fn test_projection_one_display_name_per_line() {
        let store = store(json!([
            {"major": "Computer Science", "title": "Data Structures"},
            {"major": "Computer Science", "course_code": "01:198:112"},
            {"major": "History", "title": "Ancient Rome"}
        ]));
        let filtered = filter_catalog(&store, "computer");
        assert_eq!(filtered.projection, "Data Structures\n01:198:112");
    }

    #[test]
    fn test_projection_set_is_redacted() {
        let store = store(json!([
            {"major": "Computer Science", "title": "Data Structures",
             "instructors": ["SMITH, JANE"]}
        ]));
        let filtered = filter_catalog(&store, "computer");
        assert!(filtered.selected[0].instructors.is_none());
    }

    #[test]
    fn test_loose_test_is_independent_of_strict_result() {
        // "systems" appears only in the description: both tests include it,
        // but a record matching only the combined blob still projects even
        // when its siblings dominate the strict set.
        let store = store(json!([
            {"major": "Computer Science", "title": "Operating Systems"},
            {"major": "Electrical", "description": "embedded systems design"}
        ]));
        let filtered = filter_catalog(&store, "systems");
        assert_eq!(filtered.selected.len(), 2);
    }

    #[test]
    fn test_empty_catalog_yields_empty_everything() {
        let store = CatalogStore::default();
        let filtered = filter_catalog(&store, "computer");
        assert!(filtered.matched.is_empty());
        assert!(filtered.projection.is_empty());
    }
}
