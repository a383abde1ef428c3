use super::super::{CacheConfig, JobsConfig, LlmConfig, TutorConfig, VisualizationConfig, WebConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Data directory (`~/.euclid-tutor`) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tutor: TutorConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub visualization: VisualizationConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

const KNOWN_PROVIDERS: &[&str] = &["ollama", "ollama-cli", "openai-compatible"];

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(ConfigError::Validation(format!(
                "llm.provider must be one of {}, got '{}'",
                KNOWN_PROVIDERS.join(", "),
                self.llm.provider
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        let threshold = self.cache.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "cache.similarity_threshold must be within (0, 1], got {threshold}"
            )));
        }
        if self.tutor.fast_mode_max_chars == 0 {
            return Err(ConfigError::Validation(
                "tutor.fast_mode_max_chars must be greater than 0".into(),
            ));
        }
        if self.visualization.execution_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "visualization.execution_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.jobs.workers == 0 {
            return Err(ConfigError::Validation(
                "jobs.workers must be at least 1".into(),
            ));
        }
        if self.jobs.list_limit_max == 0 {
            return Err(ConfigError::Validation(
                "jobs.list_limit_max must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
