//! Turns raw model output into a [`Plan`].
//!
//! Three stages, each more forgiving than the last: a JSON object (whole text
//! or the first balanced `{...}` block that validates), a marker scan over
//! near-JSON prose, and finally the raw text itself as the solution. Only an
//! empty completion is an error.

use super::types::{Check, CheckStatus, Plan, VisualizationKind, VisualizationRequest};
use crate::error::PlanError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

const DEFAULT_CHECK_NAME: &str = "consistency";
const DEFAULT_GOAL: &str = "Generated visualization";

static JSON_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid json fence regex"));
static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:python|py)?\r?\n(.*?)```").expect("valid code fence regex")
});
static SOLUTION_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""solution"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid solution field regex")
});
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""step"\s*:\s*"?(\d+)"?\s*,\s*"(?:text|explanation)"\s*:\s*"([^"]+)""#)
        .expect("valid step regex")
});
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""description"\s*:\s*"([^"]+)""#).expect("valid description regex")
});
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""explanation"\s*:\s*"([^"]+)""#).expect("valid explanation regex")
});
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"type"\s*:\s*"(manim|plotly)""#).expect("valid visualization type regex")
});
static GOAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""goal"\s*:\s*"([^"]+)""#).expect("valid goal regex"));
static NEEDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"needs_visualization"\s*:\s*(true|false)"#).expect("valid needs regex")
});
static CODE_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""code"\s*:\s*"([\s\S]*?)"\s*[,}]"#).expect("valid code field regex")
});

// ParsedPlan — which parsing stage produced the plan
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPlan {
    /// Valid JSON, normalized.
    Structured(Plan),
    /// Near-JSON prose recovered from recognizable markers.
    Loose(Plan),
    /// Nothing recognizable; the raw completion is the solution.
    RawFallback(Plan),
}

impl ParsedPlan {
    pub fn into_plan(self) -> Plan {
        match self {
            Self::Structured(p) | Self::Loose(p) | Self::RawFallback(p) => p,
        }
    }

    pub fn plan(&self) -> &Plan {
        match self {
            Self::Structured(p) | Self::Loose(p) | Self::RawFallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::RawFallback(_))
    }
}

/// Parse a raw completion. Never fails for non-empty input.
pub fn parse(raw: &str) -> Result<ParsedPlan, PlanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlanError::EmptyCompletion);
    }

    if let Some(Value::Object(payload)) = extract_json_block(trimmed)
        .and_then(|block| serde_json::from_str::<Value>(block).ok())
    {
        let plan = normalize(payload);
        if !plan.solution.trim().is_empty() {
            return Ok(ParsedPlan::Structured(plan));
        }
        debug!("structured plan had no solution text, trying loose parse");
    }

    if let Some(plan) = parse_loose(trimmed) {
        return Ok(ParsedPlan::Loose(plan));
    }

    warn!("model returned non-JSON output, using raw text as solution");
    Ok(ParsedPlan::RawFallback(Plan::text_only(trimmed)))
}

/// The whole text when it is a JSON object, else the first balanced
/// `{...}` block that parses as one.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if is_json_object(text) {
        return Some(text);
    }
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_end(text, start).map(|end| &text[start..end]))
        .find(|candidate| is_json_object(candidate))
}

fn is_json_object(text: &str) -> bool {
    matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
}

/// Byte index one past the `}` closing the brace at `start`, honouring
/// string literals and escapes.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn non_null<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `1. first\n2. second` from a list of strings or `{description|text}` objects.
fn numbered(items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = match item {
                Value::Object(step) => step
                    .get("description")
                    .or_else(|| step.get("text"))
                    .filter(|v| truthy(v))
                    .map_or_else(|| item.to_string(), render_value),
                other => render_value(other),
            };
            format!("{}. {text}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn solution_text(payload: &Map<String, Value>) -> String {
    // A blank `solution` string counts as missing.
    let source = non_null(payload, "solution")
        .filter(|v| v.as_str().is_none_or(|s| !s.trim().is_empty()))
        .or_else(|| payload.get("explanation").filter(|v| truthy(v)))
        .or_else(|| payload.get("steps").filter(|v| truthy(v)));
    match source {
        Some(Value::Array(items)) => numbered(items),
        Some(other) => render_value(other),
        None => String::new(),
    }
}

fn normalize_checks(value: Option<&Value>) -> Vec<Check> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let name = entry
                .get("name")
                .filter(|v| truthy(v))
                .map_or_else(|| DEFAULT_CHECK_NAME.to_string(), render_value);
            let status = entry
                .get("status")
                .and_then(Value::as_str)
                .map_or(CheckStatus::Warn, CheckStatus::coerce);
            let details = entry
                .get("details")
                .or_else(|| entry.get("message"))
                .filter(|v| truthy(v))
                .map(render_value)
                .unwrap_or_default();
            Check {
                name,
                status,
                details,
            }
        })
        .collect()
}

/// Literal `\n` sequences become newlines when the code has no real ones.
fn unescape_code(code: &str) -> String {
    if code.contains("\\n") && !code.contains('\n') {
        code.replace("\\n", "\n").replace("\\t", "\t").replace("\\\"", "\"")
    } else {
        code.to_string()
    }
}

fn normalize_visualization(value: Option<&Value>) -> Option<VisualizationRequest> {
    let block = value?.as_object()?;
    let label = block
        .get("type")
        .or_else(|| block.get("kind"))
        .and_then(Value::as_str)?;
    let Some(kind) = VisualizationKind::from_label(label) else {
        warn!(label, "ignoring visualization with unknown type");
        return None;
    };
    let goal = block
        .get("goal")
        .and_then(Value::as_str)
        .filter(|g| !g.trim().is_empty())
        .unwrap_or(DEFAULT_GOAL)
        .to_string();
    let parameters = block
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();
    let code = block
        .get("code")
        .and_then(Value::as_str)
        .map(unescape_code)
        .filter(|c| !c.trim().is_empty());
    Some(VisualizationRequest {
        kind,
        goal,
        parameters,
        code,
    })
}

/// Apply the visualization invariant: no request when it is not needed.
fn settle_visualization(
    needs: Option<bool>,
    visualization: Option<VisualizationRequest>,
) -> (bool, Option<VisualizationRequest>) {
    let needs = needs.unwrap_or(visualization.is_some());
    match (needs, visualization) {
        (false, Some(_)) => {
            debug!("dropping visualization block for a plan that does not need one");
            (false, None)
        }
        (true, None) => {
            warn!("plan asks for a visualization but carries no request");
            (true, None)
        }
        (needs, visualization) => (needs, visualization),
    }
}

fn normalize(payload: Map<String, Value>) -> Plan {
    let solution = solution_text(&payload);
    let plain_explanation = non_null(&payload, "plain_explanation")
        .map(render_value)
        .or_else(|| Some(solution.clone()));
    let axiomatic_explanation = non_null(&payload, "axiomatic_explanation")
        .map(render_value)
        .filter(|s| !s.is_empty());
    let checks = normalize_checks(payload.get("checks"));
    let needs = payload.get("needs_visualization").and_then(Value::as_bool);
    let (needs_visualization, visualization) =
        settle_visualization(needs, normalize_visualization(payload.get("visualization")));

    Plan {
        solution,
        plain_explanation,
        axiomatic_explanation,
        checks,
        needs_visualization,
        visualization,
    }
}

fn json_string_literal(escaped: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{escaped}\""))
        .unwrap_or_else(|_| escaped.to_string())
}

/// Code field from a JSON-looking block that does not parse.
fn code_from_broken_json(block: &str) -> Option<String> {
    let idx = block.find("\"code\"")?;
    let (_, value) = block[idx..].split_once(':')?;
    let value = value.trim_start();
    let value = value.strip_prefix('"').unwrap_or(value);
    let mut lines: Vec<&str> = value.lines().collect();
    while lines
        .last()
        .is_some_and(|l| matches!(l.trim(), "}" | "}," | "\"" | "\","))
    {
        lines.pop();
    }
    let joined = lines.join("\n");
    let joined = joined.trim_end();
    let code = joined.strip_suffix('"').unwrap_or(joined).trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn loose_solution(raw: &str) -> Option<String> {
    if let Some(caps) = SOLUTION_FIELD_RE.captures(raw) {
        let text = json_string_literal(&caps[1]);
        if !text.trim().is_empty() {
            return Some(text);
        }
    }

    let steps: Vec<String> = STEP_RE
        .captures_iter(raw)
        .map(|c| format!("{}. {}", &c[1], &c[2]))
        .collect();
    if !steps.is_empty() {
        return Some(steps.join("\n"));
    }

    let mut items: Vec<&str> = DESCRIPTION_RE
        .captures_iter(raw)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if items.is_empty() {
        items = EXPLANATION_RE
            .captures_iter(raw)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
    }
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn loose_code(raw: &str) -> Option<String> {
    if let Some(caps) = CODE_FENCE_RE.captures(raw) {
        return Some(caps[1].trim().to_string());
    }
    if let Some(caps) = JSON_FENCE_RE.captures(raw) {
        return code_from_broken_json(caps[1].trim()).map(|c| unescape_code(&c));
    }
    if let Some(caps) = CODE_FIELD_RE.captures(raw) {
        return Some(unescape_code(caps[1].trim()));
    }
    raw.find("class GeneratedScene")
        .map(|idx| raw[idx..].trim().to_string())
}

fn parse_loose(raw: &str) -> Option<Plan> {
    let solution = loose_solution(raw);
    let kind = TYPE_RE
        .captures(raw)
        .and_then(|c| VisualizationKind::from_label(&c[1]));
    let code = loose_code(raw).filter(|c| !c.is_empty());

    if solution.is_none() && kind.is_none() && code.is_none() {
        return None;
    }

    let visualization = kind.map(|kind| VisualizationRequest {
        kind,
        goal: GOAL_RE
            .captures(raw)
            .map_or_else(|| DEFAULT_GOAL.to_string(), |c| c[1].to_string()),
        parameters: BTreeMap::new(),
        code,
    });
    let needs = NEEDS_RE
        .captures(raw)
        .map(|c| c[1].eq_ignore_ascii_case("true"));
    let (needs_visualization, visualization) = settle_visualization(needs, visualization);
    let solution = solution.unwrap_or_else(|| raw.to_string());

    Some(Plan {
        plain_explanation: Some(solution.clone()),
        solution,
        axiomatic_explanation: None,
        checks: Vec::new(),
        needs_visualization,
        visualization,
    })
}
