//! Scripted [`TextGenerator`] used by pipeline tests. Outcomes are queued in
//! order; each `generate` call pops the next one and records the instruction
//! it was given.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, Part, TextGenerator};

type Outcome = Result<String, LlmError>;

#[derive(Default)]
pub struct MockGenerator {
    outcomes: Mutex<Vec<Outcome>>,
    pub instructions: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn with_outcomes(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding_with(text: &str) -> Self {
        Self::with_outcomes(vec![Ok(text.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.instructions.lock().unwrap().len()
    }

    pub fn transient_error() -> LlmError {
        LlmError::Api {
            status: 500,
            api_status: Some("INTERNAL".to_string()),
            message: "internal server error".to_string(),
        }
    }

    pub fn fatal_error() -> LlmError {
        LlmError::Api {
            status: 403,
            api_status: Some("PERMISSION_DENIED".to_string()),
            message: "API key not valid".to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _parts: &[Part], instruction: &str) -> Result<String, LlmError> {
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        outcomes.remove(0)
    }
}
