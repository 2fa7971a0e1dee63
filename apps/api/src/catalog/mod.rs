//! Course catalog — the read-only, in-memory view of catalog records the
//! pipeline matches against.
//!
//! FIELD PRECEDENCE TABLE (the only place "which field wins" is decided;
//! every stage needing a display key or code consults these accessors):
//!
//! | accessor        | order                                              |
//! |-----------------|----------------------------------------------------|
//! | `display_key`   | title → name → course_title → course_code → code   |
//! | `code`          | course_code → code → subject                       |
//! | `matched_title` | title → name                                       |
//!
//! Field presence is never guaranteed; absence is valid, not an error.

pub mod fetch;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A single course record. All fields optional — catalogs from different
/// sources agree on none of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseRecord {
    pub major: Option<String>,
    pub majors: Option<Vec<String>>,
    pub department: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub course_title: Option<String>,
    pub course_code: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub catalog_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructors: Option<BTreeSet<String>>,
}

fn first_nonempty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| *c)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

impl CourseRecord {
    /// The key a recommendation is matched against. See the precedence table.
    pub fn display_key(&self) -> Option<&str> {
        first_nonempty(&[
            self.title.as_deref(),
            self.name.as_deref(),
            self.course_title.as_deref(),
            self.course_code.as_deref(),
            self.code.as_deref(),
        ])
    }

    /// The canonical course code inlined by the annotator.
    pub fn code(&self) -> Option<&str> {
        first_nonempty(&[
            self.course_code.as_deref(),
            self.code.as_deref(),
            self.subject.as_deref(),
        ])
    }

    /// The title reported back on a match.
    pub fn matched_title(&self) -> Option<&str> {
        first_nonempty(&[self.title.as_deref(), self.name.as_deref()])
    }

    /// Lowercased concatenation of the major/department/subject-like fields.
    pub fn major_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(m) = &self.major {
            parts.push(m.clone());
        }
        if let Some(ms) = &self.majors {
            parts.extend(ms.iter().cloned());
        }
        if let Some(d) = &self.department {
            parts.push(d.clone());
        }
        if let Some(s) = &self.subject {
            parts.push(s.clone());
        }
        parts.join(" ").to_lowercase()
    }

    /// Lowercased concatenation of the title/description-like fields.
    pub fn text_blob(&self) -> String {
        [
            self.title.as_deref(),
            self.description.as_deref(),
            self.name.as_deref(),
            self.catalog_description.as_deref(),
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    /// Everything `major_text` and `text_blob` cover, combined. Used by the
    /// projection's looser recall-maximizing test.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.major_text(), self.text_blob())
    }

    /// Returns a copy with instructor-identifying fields stripped.
    pub fn redacted(&self) -> CourseRecord {
        CourseRecord {
            instructors: None,
            ..self.clone()
        }
    }
}

/// Ordered, immutable sequence of course records for one pipeline run.
///
/// Iteration order is JSON document order (serde_json preserves arrays), so
/// substring and fuzzy tie-breaks are reproducible for a given catalog file.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    records: Vec<CourseRecord>,
}

impl CatalogStore {
    /// Loads a catalog from a JSON file: either a flat array of records, or
    /// an object whose first array-valued field holds them. Entries that are
    /// not objects are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog JSON {}", path.display()))?;
        let store = Self::from_value(value);
        debug!(
            "Loaded {} catalog records from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_value(value: Value) -> Self {
        let array = match value {
            Value::Array(items) => items,
            Value::Object(map) => map
                .into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let records = array
            .into_iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value::<CourseRecord>(item).ok())
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
