use serde::{Deserialize, Serialize};

/// Generation port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" | "ollama-cli" | "openai-compatible"
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_provider() -> String {
    "ollama".into()
}

fn default_model() -> String {
    "qwen2.5-math:7b".into()
}

#[allow(clippy::unnecessary_wraps)]
fn default_base_url() -> Option<String> {
    Some("http://localhost:11434".into())
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f64 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}
