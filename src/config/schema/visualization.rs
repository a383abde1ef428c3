use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
    /// Stable directory for rendered animations. Tilde is expanded.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    #[serde(default = "default_animation_format")]
    pub animation_format: String,
}

fn default_python_bin() -> String {
    "python3".into()
}

fn default_execution_timeout_secs() -> u64 {
    60
}

fn default_media_dir() -> String {
    "~/.euclid-tutor/media".into()
}

fn default_animation_format() -> String {
    "gif".into()
}

impl VisualizationConfig {
    pub fn resolved_media_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.media_dir).to_string())
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            python_bin: default_python_bin(),
            execution_timeout_secs: default_execution_timeout_secs(),
            media_dir: default_media_dir(),
            animation_format: default_animation_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_dir_expands_tilde() {
        let cfg = VisualizationConfig::default();
        let resolved = cfg.resolved_media_dir();
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with(".euclid-tutor/media"));
    }

    #[test]
    fn absolute_media_dir_is_untouched() {
        let cfg = VisualizationConfig {
            media_dir: "/srv/media".into(),
            ..VisualizationConfig::default()
        };
        assert_eq!(cfg.resolved_media_dir(), PathBuf::from("/srv/media"));
    }
}
