use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

// CheckStatus — verdict of one quality or symbolic rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
}

impl CheckStatus {
    /// Anything other than an explicit `pass` is a `warn`.
    pub fn coerce(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("pass") {
            Self::Pass
        } else {
            Self::Warn
        }
    }
}

// Check — named pass/warn verdict, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

impl Check {
    pub fn pass(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: details.into(),
        }
    }

    pub fn warn(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: details.into(),
        }
    }

    pub fn verdict(name: &str, ok: bool, pass: &str, warn: &str) -> Self {
        if ok {
            Self::pass(name, pass)
        } else {
            Self::warn(name, warn)
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

// VisualizationKind — chart (plotly) or animation (manim)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisualizationKind {
    Chart,
    Animation,
}

impl VisualizationKind {
    /// Accepts the renderer names models emit as well as the kind names.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "plotly" | "chart" => Some(Self::Chart),
            "manim" | "animation" => Some(Self::Animation),
            _ => None,
        }
    }

    pub const fn renderer(self) -> &'static str {
        match self {
            Self::Chart => "plotly",
            Self::Animation => "manim",
        }
    }
}

// VisualizationRequest — pre-execution recipe, consumed once by the executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationRequest {
    pub kind: VisualizationKind,
    pub goal: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub code: Option<String>,
}

// VisualizationPayload — rendered result: chart spec or {url, format}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPayload {
    pub id: String,
    pub kind: VisualizationKind,
    pub title: String,
    pub data: serde_json::Value,
}

// Plan — structured answer produced by the plan parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub solution: String,
    #[serde(default)]
    pub plain_explanation: Option<String>,
    #[serde(default)]
    pub axiomatic_explanation: Option<String>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub needs_visualization: bool,
    #[serde(default)]
    pub visualization: Option<VisualizationRequest>,
}

impl Plan {
    /// A plan carrying only solution text.
    pub fn text_only(solution: impl Into<String>) -> Self {
        Self {
            solution: solution.into(),
            plain_explanation: None,
            axiomatic_explanation: None,
            checks: Vec::new(),
            needs_visualization: false,
            visualization: None,
        }
    }
}

// HistoryTurn — one prior conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

impl HistoryTurn {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

// TutorAnswer — what the service hands back to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorAnswer {
    pub solution: String,
    #[serde(default)]
    pub visualization: Option<VisualizationPayload>,
}
