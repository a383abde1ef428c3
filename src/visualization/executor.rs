use super::sandbox::{ProcessRunner, ScriptRunner};
use crate::config::VisualizationConfig;
use crate::error::VisualizationError;
use crate::tutor::types::{VisualizationKind, VisualizationPayload, VisualizationRequest};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Class the animation source must define.
pub const SCENE_CLASS: &str = "GeneratedScene";
/// File the chart wrapper writes the serialized figure to.
const FIGURE_FILE: &str = "figure.json";
const CHART_SCRIPT: &str = "chart.py";
const SCENE_SCRIPT: &str = "scene.py";

const CHART_PRELUDE: &str = "\
import json
import math

import plotly.graph_objects as go
import plotly.express as px
import plotly.io as pio
";

const CHART_EPILOGUE: &str = r#"

if "fig" not in globals():
    raise RuntimeError("chart code must assign a plotly figure to `fig`")

with open("figure.json", "w", encoding="utf-8") as handle:
    handle.write(pio.to_json(fig))
"#;

/// Turns a [`VisualizationRequest`] into a rendered payload.
///
/// Each run gets its own scratch directory; only animations outlive the
/// run, copied into the media directory and served from `/animations/`.
pub struct VisualizationExecutor {
    runner: Arc<dyn ScriptRunner>,
    python_bin: String,
    timeout: Duration,
    media_dir: PathBuf,
    animation_format: String,
}

impl VisualizationExecutor {
    pub fn new(
        runner: Arc<dyn ScriptRunner>,
        python_bin: impl Into<String>,
        timeout: Duration,
        media_dir: PathBuf,
        animation_format: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            python_bin: python_bin.into(),
            timeout,
            media_dir,
            animation_format: animation_format.into(),
        }
    }

    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self::new(
            Arc::new(ProcessRunner::new()),
            config.python_bin.clone(),
            Duration::from_secs(config.execution_timeout_secs),
            config.resolved_media_dir(),
            config.animation_format.clone(),
        )
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Render the request, logging and swallowing any failure.
    pub async fn execute(&self, request: &VisualizationRequest) -> Option<VisualizationPayload> {
        match self.try_execute(request).await {
            Ok(payload) => {
                tracing::info!(id = %payload.id, kind = %payload.kind, "visualization rendered");
                Some(payload)
            }
            Err(e) => {
                tracing::warn!(kind = %request.kind, goal = %request.goal, error = %e, "visualization failed");
                None
            }
        }
    }

    pub async fn try_execute(
        &self,
        request: &VisualizationRequest,
    ) -> Result<VisualizationPayload, VisualizationError> {
        let code = request
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(VisualizationError::EmptySource)?;

        let workdir = tempfile::Builder::new()
            .prefix("euclid-viz-")
            .tempdir()?;

        match request.kind {
            VisualizationKind::Chart => self.render_chart(code, &request.goal, workdir.path()).await,
            VisualizationKind::Animation => {
                self.render_animation(code, &request.goal, workdir.path())
                    .await
            }
        }
    }

    async fn render_chart(
        &self,
        code: &str,
        goal: &str,
        workdir: &Path,
    ) -> Result<VisualizationPayload, VisualizationError> {
        let script = workdir.join(CHART_SCRIPT);
        tokio::fs::write(&script, format!("{CHART_PRELUDE}\n{code}\n{CHART_EPILOGUE}")).await?;

        let args = vec![script.to_string_lossy().into_owned()];
        self.runner
            .run(&self.python_bin, &args, workdir, self.timeout)
            .await?;

        let raw = tokio::fs::read_to_string(workdir.join(FIGURE_FILE))
            .await
            .map_err(|_| VisualizationError::MissingOutput(FIGURE_FILE.to_string()))?;
        let data = chart_data(&raw)?;

        Ok(VisualizationPayload {
            id: new_id("plotly"),
            kind: VisualizationKind::Chart,
            title: goal.to_string(),
            data,
        })
    }

    async fn render_animation(
        &self,
        code: &str,
        goal: &str,
        workdir: &Path,
    ) -> Result<VisualizationPayload, VisualizationError> {
        if !code.contains(SCENE_CLASS) {
            return Err(VisualizationError::MissingEntryPoint(SCENE_CLASS.to_string()));
        }

        let id = new_id("manim");
        let format = self.animation_format.as_str();
        let script = workdir.join(SCENE_SCRIPT);
        tokio::fs::write(&script, code).await?;

        let args = vec![
            "-m".to_string(),
            "manim".to_string(),
            "-ql".to_string(),
            script.to_string_lossy().into_owned(),
            SCENE_CLASS.to_string(),
            format!("--format={format}"),
            "--media_dir".to_string(),
            workdir.to_string_lossy().into_owned(),
            "-o".to_string(),
            id.clone(),
        ];
        self.runner
            .run(&self.python_bin, &args, workdir, self.timeout)
            .await?;

        let rendered = find_rendered(workdir, &id, format)
            .ok_or_else(|| VisualizationError::MissingOutput(format!("{id}.{format}")))?;

        tokio::fs::create_dir_all(&self.media_dir).await?;
        let file_name = format!("{id}.{format}");
        tokio::fs::copy(&rendered, self.media_dir.join(&file_name)).await?;

        Ok(VisualizationPayload {
            id,
            kind: VisualizationKind::Animation,
            title: goal.to_string(),
            data: json!({
                "url": format!("/animations/{file_name}"),
                "format": format,
            }),
        })
    }
}

/// `{data, layout}` from a serialized figure, theme template removed.
fn chart_data(raw: &str) -> Result<Value, VisualizationError> {
    let figure: Value = serde_json::from_str(raw)
        .map_err(|e| VisualizationError::InvalidOutput(e.to_string()))?;
    let Value::Object(mut figure) = figure else {
        return Err(VisualizationError::InvalidOutput(
            "figure is not a JSON object".into(),
        ));
    };

    let data = figure.remove("data").unwrap_or_else(|| json!([]));
    let mut layout = figure.remove("layout").unwrap_or_else(|| json!({}));
    if let Some(layout) = layout.as_object_mut() {
        layout.remove("template");
    }
    Ok(json!({ "data": data, "layout": layout }))
}

/// Prefer the file named after the run id; any file of the format otherwise.
fn find_rendered(root: &Path, id: &str, format: &str) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == format))
        .collect();

    candidates
        .iter()
        .find(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().contains(id))
        })
        .or_else(|| candidates.first())
        .cloned()
}

fn new_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &hex[..12])
}
