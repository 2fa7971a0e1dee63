//! Catalog acquisition — fetches the university schedule-of-classes feed and
//! dumps a flat list of course records to the catalog path. Runs on demand
//! via `POST /api/v1/catalog/refresh`; the pipeline itself only ever reads
//! the dumped file.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::info;

use super::CourseRecord;

const SOC_API_URL: &str = "https://classes.rutgers.edu/soc/api/courses.json";

#[derive(Debug, Clone, Deserialize)]
pub struct FetchParams {
    #[serde(default = "default_year")]
    pub year: u16,
    #[serde(default = "default_term")]
    pub term: u8,
    #[serde(default = "default_campus")]
    pub campus: String,
}

fn default_year() -> u16 {
    2025
}

fn default_term() -> u8 {
    9
}

fn default_campus() -> String {
    "NB".to_string()
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            year: default_year(),
            term: default_term(),
            campus: default_campus(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SocCourse {
    #[serde(rename = "subjectDescription")]
    subject_description: Option<String>,
    #[serde(rename = "courseString")]
    course_string: Option<String>,
    title: Option<String>,
    #[serde(default)]
    sections: Vec<SocSection>,
}

#[derive(Debug, Deserialize)]
struct SocSection {
    #[serde(default)]
    instructors: Vec<SocInstructor>,
}

#[derive(Debug, Deserialize)]
struct SocInstructor {
    name: Option<String>,
}

fn flatten(course: SocCourse) -> CourseRecord {
    let instructors: BTreeSet<String> = course
        .sections
        .into_iter()
        .flat_map(|s| s.instructors)
        .filter_map(|i| i.name)
        .collect();

    CourseRecord {
        major: course.subject_description,
        course_code: course.course_string,
        title: course.title,
        instructors: (!instructors.is_empty()).then_some(instructors),
        ..CourseRecord::default()
    }
}

/// Fetches the feed and overwrites the catalog file. Returns the record count.
pub async fn refresh_catalog(params: &FetchParams, catalog_path: &Path) -> Result<usize> {
    let client = reqwest::Client::new();
    let response = client
        .get(SOC_API_URL)
        .query(&[
            ("year", params.year.to_string()),
            ("term", params.term.to_string()),
            ("campus", params.campus.clone()),
        ])
        .send()
        .await
        .context("Schedule-of-classes request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Schedule-of-classes API returned {}",
            response.status()
        ));
    }

    let courses: Vec<SocCourse> = response
        .json()
        .await
        .context("Failed to decode schedule-of-classes response")?;

    let records: Vec<CourseRecord> = courses.into_iter().map(flatten).collect();
    let count = records.len();

    let serialized =
        serde_json::to_string_pretty(&records).context("Failed to serialize catalog records")?;
    std::fs::write(catalog_path, serialized)
        .with_context(|| format!("Failed to write catalog to {}", catalog_path.display()))?;

    info!("Saved {count} courses to {}", catalog_path.display());
    Ok(count)
}
