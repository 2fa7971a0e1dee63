//! Major inference — derives a single-token field-of-study label from the
//! resume via one generation call.
//!
//! This stage never fails and never returns an empty label: a bad response
//! degrades to a keyword scan of the resume text, and that degrades to the
//! `"undecided"` sentinel. The call is deliberately NOT retried — only the
//! main recommendation call carries a retry policy.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::llm_client::{Part, TextGenerator};
use crate::pipeline::prompts::MAJOR_PROMPT;

pub const UNDECIDED: &str = "undecided";

/// Evidence carried into the recommendation instruction.
const EVIDENCE_MAX_CHARS: usize = 300;

/// Scanned against the resume text when the generation response yields no
/// usable token.
const KNOWN_MAJOR_KEYWORDS: &[&str] = &["electrical", "ece", "computer", "anthropology", "civil"];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9_-]+").unwrap())
}

/// The inferred label plus the raw response excerpt quoted as evidence in the
/// recommendation instruction.
#[derive(Debug, Clone)]
pub struct MajorInference {
    pub label: String,
    pub evidence: String,
}

impl MajorInference {
    /// Filesystem-safe form of the label, used in the projection filename.
    pub fn safe_label(&self) -> String {
        self.label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Infers the candidate's major from the resume PDF. `resume_text` is the
/// best-effort decoded text used for the keyword fallback.
pub async fn infer_major(
    llm: &dyn TextGenerator,
    resume_bytes: &[u8],
    resume_text: &str,
) -> MajorInference {
    let response = llm
        .generate(&[Part::Pdf(resume_bytes.to_vec())], MAJOR_PROMPT)
        .await;

    let (label, evidence) = match response {
        Ok(text) => {
            let evidence: String = text.chars().take(EVIDENCE_MAX_CHARS).collect();
            (extract_label(&text), evidence)
        }
        Err(e) => {
            warn!("Major inference call failed, falling back to keyword scan: {e}");
            (None, String::new())
        }
    };

    let label = label
        .or_else(|| keyword_fallback(resume_text))
        .unwrap_or_else(|| UNDECIDED.to_string());

    info!("Inferred major '{label}'");
    MajorInference { label, evidence }
}

/// First maximal run of letters/digits/`_`/`-`, lowercased.
fn extract_label(text: &str) -> Option<String> {
    token_re()
        .find(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|s| !s.is_empty())
}

fn keyword_fallback(resume_text: &str) -> Option<String> {
    let haystack = resume_text.to_lowercase();
    KNOWN_MAJOR_KEYWORDS
        .iter()
        .find(|kw| haystack.contains(**kw))
        .map(|kw| kw.to_string())
}
