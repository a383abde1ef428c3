//! Multi-agent answer pipeline.
//!
//! The planner produces the base plan; each auxiliary agent then gets its
//! own prompt and either contributes a section or nothing. Agents run in a
//! fixed order and never abort one another.

use super::agents::AgentId;
use super::planner::TutorPlanner;
use super::prompts::{PromptBook, SnippetLine, format_history};
use super::types::{HistoryTurn, Plan};
use crate::llm::{Generation, GenerationEngine};
use crate::observability::AgentMetricsRegistry;
use crate::web::WebEnricher;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Snippets handed to the web-research agent.
const WEB_RESEARCH_SNIPPETS: usize = 2;

/// Base plan plus the sections gathered so far, in arrival order.
struct Accumulator {
    plan: Plan,
    sections: Vec<(AgentId, String)>,
}

impl Accumulator {
    fn new(plan: Plan) -> Self {
        Self {
            plan,
            sections: Vec::new(),
        }
    }

    fn push(&mut self, agent: AgentId, text: String) {
        self.sections.push((agent, text));
    }

    fn finish(mut self) -> Plan {
        let additions: Vec<String> = self
            .sections
            .into_iter()
            .filter_map(|(agent, text)| agent.heading().map(|h| format!("{h}\n{text}")))
            .collect();
        if !additions.is_empty() {
            self.plan.solution = format!(
                "{}\n\n{}",
                self.plan.solution.trim_end(),
                additions.join("\n\n")
            );
        }
        self.plan
    }
}

pub struct MultiAgentCoordinator {
    engine: GenerationEngine,
    planner: TutorPlanner,
    prompts: Arc<PromptBook>,
    web: Arc<WebEnricher>,
    metrics: Arc<AgentMetricsRegistry>,
    history_window: usize,
}

impl MultiAgentCoordinator {
    pub fn new(
        engine: GenerationEngine,
        planner: TutorPlanner,
        prompts: Arc<PromptBook>,
        web: Arc<WebEnricher>,
        metrics: Arc<AgentMetricsRegistry>,
        history_window: usize,
    ) -> Self {
        Self {
            engine,
            planner,
            prompts,
            web,
            metrics,
            history_window,
        }
    }

    pub fn metrics(&self) -> &Arc<AgentMetricsRegistry> {
        &self.metrics
    }

    /// `None` when the engine is unavailable or the planner produced nothing.
    pub async fn answer(&self, question: &str, history: &[HistoryTurn]) -> Option<Plan> {
        if !self.engine.is_available() {
            return None;
        }

        let plan = self.run_planner(question, history).await?;
        let draft = plan.solution.clone();
        let mut acc = Accumulator::new(plan);

        let context = format_history(history, self.history_window);
        for agent in AgentId::AUXILIARY {
            let prompt = self.prompts.agent(agent, question, &context);
            if let Some(text) = self.run_agent(agent, prompt).await {
                acc.push(agent, text);
            }
        }

        if let Some(notes) = self.run_web_research(question, &draft).await {
            acc.push(AgentId::WebResearch, notes);
        }

        let plan = acc.finish();
        debug!(chars = plan.solution.len(), "multi-agent answer assembled");
        Some(plan)
    }

    async fn run_planner(&self, question: &str, history: &[HistoryTurn]) -> Option<Plan> {
        let id = AgentId::Planner.id();
        let started = Instant::now();
        self.metrics.record_start(id);
        let plan = self.planner.plan(question, history).await;
        let elapsed_ms = elapsed_ms(started);
        match &plan {
            Some(_) => self.metrics.record_success(id, elapsed_ms),
            None => {
                warn!(agent = id, elapsed_ms, "planner agent produced no plan");
                self.metrics
                    .record_error(id, elapsed_ms, "Planner returned None");
            }
        }
        plan
    }

    async fn run_agent(&self, agent: AgentId, prompt: anyhow::Result<String>) -> Option<String> {
        let id = agent.id();
        let started = Instant::now();
        self.metrics.record_start(id);

        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => {
                let message = format!("prompt rendering failed: {e:#}");
                warn!(agent = id, "{message}");
                self.metrics.record_error(id, elapsed_ms(started), &message);
                return None;
            }
        };

        let outcome = self.engine.generate(&prompt).await;
        let elapsed_ms = elapsed_ms(started);
        let failure = match outcome {
            Generation::Text(text) if !text.trim().is_empty() => {
                self.metrics.record_success(id, elapsed_ms);
                debug!(agent = id, elapsed_ms, "agent finished");
                return Some(text.trim().to_string());
            }
            Generation::Text(_) | Generation::Empty => "Empty output".to_string(),
            Generation::TimedOut => "Timed out".to_string(),
            Generation::Failed(message) => message,
            Generation::Unavailable => "Provider unavailable".to_string(),
        };
        warn!(agent = id, elapsed_ms, error = %failure, "agent failed");
        self.metrics.record_error(id, elapsed_ms, &failure);
        None
    }

    async fn run_web_research(&self, question: &str, draft: &str) -> Option<String> {
        if !self.web.should_enrich(question, draft) {
            return None;
        }
        let snippets = self.web.retrieve(question, WEB_RESEARCH_SNIPPETS).await;
        if snippets.is_empty() {
            return None;
        }
        let lines: Vec<SnippetLine<'_>> = snippets
            .iter()
            .map(|s| SnippetLine::new(&s.title, &s.snippet, &s.url))
            .collect();
        let prompt = self.prompts.web_research(question, &lines);
        self.run_agent(AgentId::WebResearch, prompt).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
