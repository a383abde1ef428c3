use super::scrub::sanitize_api_error;
use super::traits::Provider;
use crate::error::GenerationError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one generation call. Timeouts stay distinguishable from
/// other failures for diagnostics, but every non-`Text` value is treated
/// the same by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Empty,
    TimedOut,
    Failed(String),
    Unavailable,
}

impl Generation {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// The generation port: a provider plus a hard wall-clock budget.
#[derive(Clone)]
pub struct GenerationEngine {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

impl GenerationEngine {
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    pub async fn generate(&self, prompt: &str) -> Generation {
        if !self.provider.is_available() {
            tracing::warn!(provider = self.provider.name(), "LLM provider not available");
            return Generation::Unavailable;
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.provider.complete(prompt)).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Err(_) => {
                tracing::error!(
                    provider = self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "LLM generation timed out"
                );
                Generation::TimedOut
            }
            Ok(Err(e)) => {
                let message = sanitize_api_error(&e.to_string());
                tracing::error!(
                    provider = self.provider.name(),
                    elapsed_ms,
                    "LLM generation failed: {message}"
                );
                Generation::Failed(message)
            }
            Ok(Ok(text)) if text.trim().is_empty() => {
                tracing::warn!(
                    provider = self.provider.name(),
                    elapsed_ms,
                    "LLM returned empty output"
                );
                Generation::Empty
            }
            Ok(Ok(text)) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    elapsed_ms,
                    chars = text.len(),
                    "LLM generation finished"
                );
                Generation::Text(text)
            }
        }
    }

    /// Like [`generate`](Self::generate) but as a typed `Result`.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let provider = self.provider.name().to_string();
        match self.generate(prompt).await {
            Generation::Text(text) => Ok(text),
            Generation::Empty => Err(GenerationError::EmptyOutput { provider }),
            Generation::TimedOut => Err(GenerationError::TimedOut {
                provider,
                secs: self.timeout.as_secs(),
            }),
            Generation::Failed(message) => Err(GenerationError::Request { provider, message }),
            Generation::Unavailable => Err(GenerationError::Unavailable { provider }),
        }
    }
}
