//! LLM Client — the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: no other module may call the generation API directly.
//! All LLM interactions go through [`TextGenerator`].
//!
//! The client makes exactly ONE attempt per call and classifies failures as
//! transient or fatal. Retry policy is the caller's concern: the
//! recommendation orchestrator retries transient failures with backoff, while
//! the major-inference call is deliberately single-shot.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
pub mod mock;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
/// The model used for all LLM calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.5-flash";

/// A single content part of a generation request. PDF bytes are inlined
/// base64-encoded; plain text travels as-is.
#[derive(Debug, Clone)]
pub enum Part {
    Pdf(Vec<u8>),
    Text(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        api_status: Option<String>,
        message: String,
    },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the failure signal indicates an internal/server-side fault
    /// and the call is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Api {
                status, api_status, ..
            } => {
                *status >= 500
                    || api_status
                        .as_deref()
                        .is_some_and(|s| s.to_uppercase().contains("INTERNAL"))
            }
            _ => false,
        }
    }
}

/// Generation capability seam: "given a list of content parts and an
/// instruction, return response text, fail on network/service error".
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so tests swap in a
/// scripted mock without touching the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, parts: &[Part], instruction: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenates the text of all parts of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    status: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Reqwest-backed Gemini client used by the pipeline in production.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn build_request(parts: &[Part], instruction: &str) -> GeminiRequest {
        let mut wire_parts: Vec<GeminiPart> = parts
            .iter()
            .map(|p| match p {
                Part::Pdf(bytes) => GeminiPart {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "application/pdf",
                        data: BASE64.encode(bytes),
                    }),
                },
                Part::Text(text) => GeminiPart {
                    text: Some(text.clone()),
                    inline_data: None,
                },
            })
            .collect();
        wire_parts.push(GeminiPart {
            text: Some(instruction.to_string()),
            inline_data: None,
        });

        GeminiRequest {
            contents: vec![GeminiContent { parts: wire_parts }],
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, parts: &[Part], instruction: &str) -> Result<String, LlmError> {
        let request_body = Self::build_request(parts, instruction);

        let response = self
            .client
            .post(GEMINI_API_URL)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Surface the structured API status when the body parses
            let (message, api_status) = serde_json::from_str::<GeminiError>(&body)
                .map(|e| (e.error.message, e.error.status))
                .unwrap_or((body, None));
            return Err(LlmError::Api {
                status: status.as_u16(),
                api_status,
                message,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response.text().ok_or(LlmError::EmptyContent)?;

        debug!("LLM call succeeded: {} chars returned", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_transient() {
        let err = LlmError::Api {
            status: 500,
            api_status: None,
            message: "boom".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_internal_status_is_transient_regardless_of_code() {
        let err = LlmError::Api {
            status: 400,
            api_status: Some("INTERNAL".to_string()),
            message: "internal error".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        let err = LlmError::Api {
            status: 403,
            api_status: Some("PERMISSION_DENIED".to_string()),
            message: "bad key".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_empty_content_is_not_transient() {
        assert!(!LlmError::EmptyContent.is_transient());
    }

    #[test]
    fn test_build_request_appends_instruction_last() {
        let parts = vec![Part::Text("course list".to_string())];
        let request = GeminiClient::build_request(&parts, "recommend courses");
        let wire = &request.contents[0].parts;
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1].text.as_deref(), Some("recommend courses"));
    }

    #[test]
    fn test_build_request_encodes_pdf_as_inline_data() {
        let parts = vec![Part::Pdf(b"%PDF-1.4".to_vec())];
        let request = GeminiClient::build_request(&parts, "instruction");
        let wire = &request.contents[0].parts;
        let inline = wire[0].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "application/pdf");
        assert_eq!(BASE64.decode(&inline.data).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_response_text_none_when_no_candidates() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }
}
