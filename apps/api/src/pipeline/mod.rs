//! Recommendation reconciliation pipeline.
//!
//! Flow: load catalog → infer major → filter catalog (+ name projection) →
//! orchestrated generation (retry/fallback) → parse response → tiered course
//! matching → two annotation passes over the persisted display document.
//!
//! Strictly sequential; the only suspension points are the outbound
//! generation calls and the backoff sleeps between retries. Artifact writes
//! are independent of each other: a failed write is logged and the remaining
//! writes still run. Partial artifacts from earlier stages are never rolled
//! back.

pub mod annotator;
pub mod filter;
pub mod major;
pub mod matcher;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod section;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::pipeline::orchestrator::RecommendationRequest;

/// Summary of one pipeline run, returned to the upload handler.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub major: String,
    pub catalog_records: usize,
    pub filtered_records: usize,
    pub recommendations: usize,
    pub matched: usize,
    pub display_document: PathBuf,
    /// Side artifacts that were actually written.
    pub artifacts: Vec<PathBuf>,
}

/// Runs the full pipeline against the configured resume and catalog.
pub async fn run_pipeline(
    config: &Config,
    llm: &dyn TextGenerator,
) -> Result<PipelineReport, AppError> {
    config.preflight()?;

    let resume_bytes = std::fs::read(&config.resume_path)
        .with_context(|| format!("Failed to read resume {}", config.resume_path.display()))?;
    let resume_text = resume_text_best_effort(&resume_bytes);

    let catalog = CatalogStore::load(&config.catalog_path).map_err(AppError::Internal)?;
    info!("Catalog loaded: {} records", catalog.len());

    let inference = major::infer_major(llm, &resume_bytes, &resume_text).await;
    let filtered = filter::filter_catalog(&catalog, &inference.label);

    let mut artifacts: Vec<PathBuf> = Vec::new();

    let projection_path = config
        .output_dir
        .join(format!("course_names_{}.txt", inference.safe_label()));
    match write_artifact(&projection_path, &with_trailing_newline(&filtered.projection)) {
        Ok(()) => artifacts.push(projection_path),
        Err(e) => warn!("Skipping projection artifact: {e}"),
    }

    let request = RecommendationRequest::new(&inference, filtered.projection.clone(), &resume_text);
    let raw = orchestrator::request_recommendations(llm, &request, &filtered.selected).await?;

    let parsed = parser::parse_response(&raw);
    let matches = matcher::match_courses(&parsed.recommendations, &catalog);
    let matched = matches.iter().filter(|m| m.matched_code.is_some()).count();
    info!(
        "Matched {matched}/{} recommendations for major '{}'",
        matches.len(),
        inference.label
    );

    let display_path = config.display_doc_path();
    if let Err(e) = write_artifact(&display_path, &parsed.display_text) {
        warn!("Failed to persist display document: {e}");
    } else {
        info!("Saved recommendation to {}", display_path.display());
    }

    // Each annotation pass re-reads the persisted document and writes its own
    // derivative; neither touches the original or the other derivative.
    let pass_a = annotate_to_file(&display_path, "_inline_codes", |text| {
        annotator::annotate_section_rewrite(text, &matches)
    });
    match pass_a {
        Ok(path) => artifacts.push(path),
        Err(e) => warn!("Skipping inline-codes derivative: {e}"),
    }

    let pass_b = annotate_to_file(&display_path, "_inline_codes_v2", |text| {
        annotator::annotate_inline_append(text, &matches, &catalog)
    });
    match pass_b {
        Ok(path) => artifacts.push(path),
        Err(e) => warn!("Skipping inline-codes v2 derivative: {e}"),
    }

    Ok(PipelineReport {
        major: inference.label,
        catalog_records: catalog.len(),
        filtered_records: filtered.matched.len(),
        recommendations: parsed.recommendations.len(),
        matched,
        display_document: display_path,
        artifacts,
    })
}

/// Decodes resume bytes: proper PDF text extraction when possible, lossy
/// UTF-8 otherwise. Never fails.
pub fn resume_text_best_effort(bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

fn write_artifact(path: &Path, content: &str) -> Result<(), AppError> {
    std::fs::write(path, content)
        .map_err(|e| AppError::Persistence(format!("{}: {e}", path.display())))
}

/// Read-modify-write of one annotation derivative: `advice.md` →
/// `advice_inline_codes.md` for suffix `"_inline_codes"`.
fn annotate_to_file(
    display_path: &Path,
    suffix: &str,
    annotate: impl Fn(&str) -> String,
) -> Result<PathBuf, AppError> {
    let text = std::fs::read_to_string(display_path)
        .map_err(|e| AppError::Persistence(format!("{}: {e}", display_path.display())))?;

    let stem = display_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recommendation");
    let extension = display_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("md");
    let out_path = display_path.with_file_name(format!("{stem}{suffix}.{extension}"));

    write_artifact(&out_path, &annotate(&text))?;
    Ok(out_path)
}
