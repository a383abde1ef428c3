use super::compatible::OpenAiCompatibleProvider;
use super::ollama::OllamaProvider;
use super::ollama_cli::OllamaCliProvider;
use super::traits::Provider;
use crate::config::LlmConfig;
use std::sync::Arc;

/// Build the provider named by `config.provider`.
pub fn create_provider(config: &LlmConfig) -> anyhow::Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(
            config.base_url.as_deref(),
            &config.model,
            config.temperature,
            config.timeout_secs,
        )),
        "ollama-cli" => Arc::new(OllamaCliProvider::new(&config.model)),
        "openai-compatible" => {
            let base_url = config
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("openai-compatible provider requires base_url"))?;
            Arc::new(OpenAiCompatibleProvider::new(
                base_url,
                config.api_key.as_deref(),
                &config.model,
                config.temperature,
                config.timeout_secs,
            ))
        }
        other => anyhow::bail!("Unknown provider: {other}"),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_ollama() {
        let p = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(p.name(), "ollama");
        assert!(p.is_available());
    }

    #[test]
    fn factory_cli() {
        let cfg = LlmConfig {
            provider: "ollama-cli".into(),
            ..LlmConfig::default()
        };
        assert_eq!(create_provider(&cfg).unwrap().name(), "ollama-cli");
    }

    #[test]
    fn factory_compatible_without_key_is_unavailable() {
        let cfg = LlmConfig {
            provider: "openai-compatible".into(),
            base_url: Some("https://api.example.com".into()),
            api_key: None,
            ..LlmConfig::default()
        };
        let p = create_provider(&cfg).unwrap();
        assert!(!p.is_available());
    }

    #[test]
    fn factory_compatible_requires_base_url() {
        let cfg = LlmConfig {
            provider: "openai-compatible".into(),
            base_url: None,
            ..LlmConfig::default()
        };
        assert!(create_provider(&cfg).is_err());
    }

    #[test]
    fn factory_unknown() {
        let cfg = LlmConfig {
            provider: "nope".into(),
            ..LlmConfig::default()
        };
        let err = create_provider(&cfg).err().unwrap();
        assert!(err.to_string().contains("Unknown provider"));
    }
}
