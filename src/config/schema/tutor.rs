use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub multi_agent_enabled: bool,
    #[serde(default)]
    pub fast_mode_enabled: bool,
    #[serde(default = "default_fast_mode_max_chars")]
    pub fast_mode_max_chars: usize,
    /// Turns of conversation history handed to auxiliary agents.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Turns of conversation history handed to the planner prompt.
    #[serde(default = "default_planner_history_window")]
    pub planner_history_window: usize,
}

fn default_true() -> bool {
    true
}

fn default_fast_mode_max_chars() -> usize {
    800
}

fn default_history_window() -> usize {
    6
}

fn default_planner_history_window() -> usize {
    10
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            multi_agent_enabled: true,
            fast_mode_enabled: false,
            fast_mode_max_chars: default_fast_mode_max_chars(),
            history_window: default_history_window(),
            planner_history_window: default_planner_history_window(),
        }
    }
}
