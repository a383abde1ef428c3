use super::Config;

fn env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("EUCLID_TUTOR_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
            && !key.is_empty()
        {
            self.llm.api_key = Some(key);
        }

        if let Ok(provider) = std::env::var("EUCLID_TUTOR_PROVIDER")
            && !provider.is_empty()
        {
            self.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("EUCLID_TUTOR_MODEL")
            && !model.is_empty()
        {
            self.llm.model = model;
        }

        if let Ok(base_url) = std::env::var("EUCLID_TUTOR_BASE_URL")
            && !base_url.is_empty()
        {
            self.llm.base_url = Some(base_url);
        }

        if let Ok(raw) = std::env::var("EUCLID_TUTOR_FAST_MODE")
            && let Some(enabled) = env_flag(&raw)
        {
            self.tutor.fast_mode_enabled = enabled;
        }

        if let Ok(raw) = std::env::var("EUCLID_TUTOR_WEB_RAG")
            && let Some(enabled) = env_flag(&raw)
        {
            self.web.enabled = enabled;
        }
    }
}
