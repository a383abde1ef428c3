use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use strum::Display;

/// Stable ids of every agent the tutor pipeline runs.
pub const KNOWN_AGENTS: [&str; 7] = [
    "planner_agent",
    "intuition_agent",
    "examples_agent",
    "proof_agent",
    "history_agent",
    "visualization_agent",
    "web_research_agent",
];

// AgentStatus — outcome of the most recent invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    Ok,
    Error,
}

// AgentMetric — per-agent counters, created lazily, never removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentMetric {
    pub status: AgentStatus,
    pub run_count: u64,
    pub last_run_ms: Option<u64>,
    pub last_error: Option<String>,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Process-wide agent counters behind a single lock.
#[derive(Debug, Default)]
pub struct AgentMetricsRegistry {
    metrics: Mutex<HashMap<String, AgentMetric>>,
}

impl AgentMetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, agent_id: &str, apply: impl FnOnce(&mut AgentMetric)) {
        let mut metrics = self
            .metrics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        apply(metrics.entry(agent_id.to_string()).or_default());
    }

    pub fn record_start(&self, agent_id: &str) {
        self.update(agent_id, |m| {
            m.status = AgentStatus::Running;
            m.last_run_at = Some(Utc::now());
        });
    }

    pub fn record_success(&self, agent_id: &str, elapsed_ms: u64) {
        self.update(agent_id, |m| {
            m.status = AgentStatus::Ok;
            m.run_count += 1;
            m.last_run_ms = Some(elapsed_ms);
            m.last_error = None;
        });
    }

    pub fn record_error(&self, agent_id: &str, elapsed_ms: u64, error: &str) {
        tracing::debug!(agent = agent_id, elapsed_ms, "agent run failed: {error}");
        self.update(agent_id, |m| {
            m.status = AgentStatus::Error;
            m.run_count += 1;
            m.last_run_ms = Some(elapsed_ms);
            m.last_error = Some(error.to_string());
        });
    }

    /// Snapshot for one agent; unknown ids read as idle.
    pub fn get(&self, agent_id: &str) -> AgentMetric {
        self.metrics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every agent seen so far, sorted by id.
    pub fn snapshot(&self) -> BTreeMap<String, AgentMetric> {
        self.metrics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect()
    }

    /// One entry per known agent, idle when it has never run.
    pub fn known(&self) -> Vec<(&'static str, AgentMetric)> {
        KNOWN_AGENTS.iter().map(|id| (*id, self.get(id))).collect()
    }
}
