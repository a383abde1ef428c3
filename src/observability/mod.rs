pub mod agent_metrics;

pub use agent_metrics::{AgentMetric, AgentMetricsRegistry, AgentStatus, KNOWN_AGENTS};
