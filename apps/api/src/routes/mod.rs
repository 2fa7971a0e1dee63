//! HTTP surface — a thin I/O wrapper around the pipeline: receive a resume,
//! trigger a run, serve the resulting document. Handlers validate, delegate,
//! and map errors; no pipeline logic lives here.

pub mod health;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::catalog::fetch::{refresh_catalog, FetchParams};
use crate::errors::AppError;
use crate::pipeline::{run_pipeline, PipelineReport};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume", post(handle_upload))
        .route("/api/v1/advice", get(handle_advice))
        .route("/api/v1/advice/download", get(handle_download))
        .route("/api/v1/catalog/refresh", post(handle_catalog_refresh))
        .with_state(state)
}

/// POST /api/v1/resume
///
/// Multipart upload (field `resume`). Persists the file to the configured
/// resume path, then runs the full pipeline and returns its report.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PipelineReport>, AppError> {
    let mut saved = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded resume is empty".to_string()));
        }
        std::fs::write(&state.config.resume_path, &data).map_err(|e| {
            AppError::Persistence(format!(
                "{}: {e}",
                state.config.resume_path.display()
            ))
        })?;
        info!(
            "Saved uploaded resume ({} bytes) to {}",
            data.len(),
            state.config.resume_path.display()
        );
        saved = true;
        break;
    }

    if !saved {
        return Err(AppError::Validation("No 'resume' file part".to_string()));
    }

    let report = run_pipeline(&state.config, state.llm.as_ref()).await?;
    Ok(Json(report))
}

/// GET /api/v1/advice
///
/// Returns the persisted display document, running the pipeline first if the
/// artifact does not exist yet.
async fn handle_advice(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let path = state.config.display_doc_path();
    if !path.exists() {
        run_pipeline(&state.config, state.llm.as_ref()).await?;
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|_| AppError::NotFound("No recommendation document found".to_string()))?;
    Ok(Json(json!({ "response": content })))
}

/// GET /api/v1/advice/download
///
/// Streams the display document as a markdown attachment.
async fn handle_download(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let path = state.config.display_doc_path();
    let content = std::fs::read_to_string(&path)
        .map_err(|_| AppError::NotFound("Recommendation document not found".to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "text/markdown; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"resume_recommendation.md\"",
        ),
    ];
    Ok((headers, content))
}

/// POST /api/v1/catalog/refresh
///
/// Re-fetches the schedule-of-classes feed and overwrites the catalog file.
/// Body is optional; defaults to the current term.
async fn handle_catalog_refresh(
    State(state): State<AppState>,
    params: Option<Json<FetchParams>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let params = params.map(|Json(p)| p).unwrap_or_default();
    let saved = refresh_catalog(&params, &state.config.catalog_path)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "saved": saved })))
}
