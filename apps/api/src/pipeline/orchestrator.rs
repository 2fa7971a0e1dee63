//! Recommendation orchestration — drives the main generation call with
//! bounded retry and a degraded fallback path.
//!
//! Policy: up to 3 attempts with the course-name projection. Transient
//! failures back off `2^attempt_index` seconds and retry; any other failure
//! aborts the loop immediately. Exhausted attempts fall back ONCE to a
//! condensed catalog digest in place of the projection; if that call also
//! fails the stage fails fatally, surfacing both causes.

use tracing::{info, warn};

use crate::catalog::CourseRecord;
use crate::errors::AppError;
use crate::llm_client::{Part, TextGenerator};
use crate::pipeline::major::MajorInference;
use crate::pipeline::prompts::recommendation_prompt;

const MAX_ATTEMPTS: u32 = 3;
/// Bounded resume excerpt attached to the request.
const RESUME_EXCERPT_CHARS: usize = 5000;
/// Fallback digest bounds.
const DIGEST_RECORD_LIMIT: usize = 50;
const DIGEST_CHAR_LIMIT: usize = 20000;

/// Immutable bundle of everything the main generation call needs.
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    projection: String,
    resume_excerpt: String,
    instruction: String,
}

impl RecommendationRequest {
    pub fn new(major: &MajorInference, projection: String, resume_text: &str) -> Self {
        Self {
            projection,
            resume_excerpt: resume_text.chars().take(RESUME_EXCERPT_CHARS).collect(),
            instruction: recommendation_prompt(&major.label, &major.evidence),
        }
    }

    fn parts(&self) -> Vec<Part> {
        let mut parts = vec![Part::Text(self.projection.clone())];
        if !self.resume_excerpt.is_empty() {
            parts.push(Part::Text(self.resume_excerpt.clone()));
        }
        parts
    }
}

/// Runs the retry loop and, if needed, the one-shot digest fallback.
/// Success at any point yields the raw generated text.
pub async fn request_recommendations(
    llm: &dyn TextGenerator,
    request: &RecommendationRequest,
    digest_records: &[CourseRecord],
) -> Result<String, AppError> {
    let parts = request.parts();
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_ATTEMPTS {
        info!(
            "Recommendation request attempt {}/{MAX_ATTEMPTS}",
            attempt + 1
        );
        match llm.generate(&parts, &request.instruction).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() => {
                warn!("Attempt {} failed with transient error: {e}", attempt + 1);
                last_error = Some(e.to_string());
                if attempt + 1 < MAX_ATTEMPTS {
                    let backoff = std::time::Duration::from_secs(1 << attempt);
                    warn!("Retrying after {}s", backoff.as_secs());
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(e) => {
                // Non-retryable: skip the remaining attempts entirely
                warn!("Attempt {} failed with non-transient error: {e}", attempt + 1);
                last_error = Some(e.to_string());
                break;
            }
        }
    }

    // Degraded path: condensed digest instead of the name projection,
    // one call, no retry.
    warn!("Primary attempts exhausted, falling back to condensed course digest");
    let digest = build_digest(digest_records);
    match llm
        .generate(&[Part::Text(digest)], &request.instruction)
        .await
    {
        Ok(text) => Ok(text),
        Err(fallback_err) => Err(AppError::Generation(format!(
            "fallback call failed: {fallback_err}; original failure: {}",
            last_error.unwrap_or_else(|| "unknown".to_string())
        ))),
    }
}

/// `"code - title: description"` per record, up to 50 records, truncated to
/// 20000 characters. Records with neither code nor title are skipped.
fn build_digest(records: &[CourseRecord]) -> String {
    let lines: Vec<String> = records
        .iter()
        .take(DIGEST_RECORD_LIMIT)
        .filter_map(|record| {
            let code = record.code().unwrap_or("");
            let title = record.matched_title().unwrap_or("");
            if code.is_empty() && title.is_empty() {
                return None;
            }
            let description = record
                .description
                .as_deref()
                .or(record.catalog_description.as_deref())
                .unwrap_or("");
            Some(format!("{code} - {title}: {description}"))
        })
        .collect();

    let digest = lines.join("\n");
    digest.chars().take(DIGEST_CHAR_LIMIT).collect()
}
