use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// Serialized course catalog (output of the scheduled fetch job).
    pub catalog_path: PathBuf,
    /// Where the uploaded resume is persisted and read back from.
    pub resume_path: PathBuf,
    /// Directory for pipeline artifacts (display document, projection, derivatives).
    pub output_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            catalog_path: PathBuf::from(
                std::env::var("CATALOG_PATH").unwrap_or_else(|_| "courses.json".to_string()),
            ),
            resume_path: PathBuf::from(
                std::env::var("RESUME_PATH").unwrap_or_else(|_| "Resume.pdf".to_string()),
            ),
            output_dir: PathBuf::from(
                std::env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Verifies the pipeline's required inputs exist before any stage runs.
    /// Their absence is a configuration error, not a pipeline failure.
    pub fn preflight(&self) -> Result<(), AppError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(AppError::Config("GEMINI_API_KEY is empty".to_string()));
        }
        require_file(&self.resume_path, "resume")?;
        require_file(&self.catalog_path, "catalog")?;
        Ok(())
    }

    /// Path of the persisted display document.
    pub fn display_doc_path(&self) -> PathBuf {
        self.output_dir.join("resume_recommendation.md")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn require_file(path: &Path, what: &str) -> Result<(), AppError> {
    if path.exists() {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{what} file not found at {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> Config {
        Config {
            gemini_api_key: "test-key".to_string(),
            catalog_path: dir.join("courses.json"),
            resume_path: dir.join("Resume.pdf"),
            output_dir: dir.to_path_buf(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_preflight_fails_on_missing_resume() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("courses.json"), "[]").unwrap();
        let config = test_config(dir.path());

        let err = config.preflight().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("resume"));
    }

    #[test]
    fn test_preflight_fails_on_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Resume.pdf"), b"%PDF-1.4").unwrap();
        let config = test_config(dir.path());

        let err = config.preflight().unwrap_err();
        assert!(err.to_string().contains("catalog"));
    }

    #[test]
    fn test_preflight_passes_when_inputs_exist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("courses.json"), "[]").unwrap();
        std::fs::write(dir.path().join("Resume.pdf"), b"%PDF-1.4").unwrap();
        let config = test_config(dir.path());

        assert!(config.preflight().is_ok());
    }

    #[test]
    fn test_preflight_fails_on_empty_credential() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("courses.json"), "[]").unwrap();
        std::fs::write(dir.path().join("Resume.pdf"), b"%PDF-1.4").unwrap();
        let mut config = test_config(dir.path());
        config.gemini_api_key = "  ".to_string();

        assert!(config.preflight().is_err());
    }
}
