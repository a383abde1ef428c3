use super::coordinator::MultiAgentCoordinator;
use super::didactics::{self, StructuredExplanation};
use super::planner::TutorPlanner;
use super::prompts::PromptBook;
use super::types::{Check, HistoryTurn, TutorAnswer, VisualizationPayload};
use crate::cache::AnswerCache;
use crate::checker::SymbolicChecker;
use crate::config::{Config, TutorConfig};
use crate::error::JobError;
use crate::jobs::{DiagramJob, DiagramJobManager, DiagramRenderer, RenderFuture};
use crate::llm::{GenerationEngine, create_provider};
use crate::observability::{AgentMetric, AgentMetricsRegistry};
use crate::visualization::{VisualizationExecutor, VisualizationResolver};
use crate::web::WebEnricher;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const NO_DIAGRAM_PLAN: &str = "No diagram plan available for this topic yet.";
const DIAGRAM_RETRY_SUFFIX: &str = ". Provide a visualization.";

/// Collaborators the service is assembled from; swap any of them in tests.
pub struct TutorDeps {
    pub engine: GenerationEngine,
    pub web: Arc<WebEnricher>,
    pub executor: Arc<VisualizationExecutor>,
    pub checker: SymbolicChecker,
    pub metrics: Arc<AgentMetricsRegistry>,
}

impl TutorDeps {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = create_provider(&config.llm).context("failed to create LLM provider")?;
        let web = WebEnricher::from_config(&config.web).context("failed to set up web retrieval")?;
        Ok(Self {
            engine: GenerationEngine::new(provider, Duration::from_secs(config.llm.timeout_secs)),
            web: Arc::new(web),
            executor: Arc::new(VisualizationExecutor::from_config(&config.visualization)),
            checker: SymbolicChecker::default(),
            metrics: Arc::new(AgentMetricsRegistry::new()),
        })
    }
}

/// Everything an answer needs; shared with the diagram workers.
struct AnswerPipeline {
    settings: TutorConfig,
    planner: TutorPlanner,
    coordinator: MultiAgentCoordinator,
    cache: AnswerCache,
    resolver: VisualizationResolver,
}

impl AnswerPipeline {
    async fn answer(&self, question: &str, history: &[HistoryTurn]) -> Option<TutorAnswer> {
        if !self.settings.enabled {
            return None;
        }
        if let Some(hit) = self.cache.lookup(question) {
            info!(kind = %hit.kind, score = hit.score, "answer cache hit");
            return Some(hit.answer);
        }

        let fast = self.settings.fast_mode_enabled;
        let mut plan = if self.settings.multi_agent_enabled && !fast {
            self.coordinator.answer(question, history).await
        } else {
            self.planner.plan(question, history).await
        }?;
        if fast {
            plan.solution = trim_for_fast_mode(&plan.solution, self.settings.fast_mode_max_chars);
        }

        let visualization = self.resolver.resolve(&plan, question).await;
        let answer = TutorAnswer {
            solution: plan.solution,
            visualization,
        };
        self.cache.put(question, answer.clone());
        Some(answer)
    }
}

impl DiagramRenderer for AnswerPipeline {
    fn render<'a>(&'a self, question: &'a str) -> RenderFuture<'a> {
        Box::pin(async move {
            if let Some(payload) = self.resolver.fallback(question).await {
                return Ok(payload);
            }
            debug!("no recipe for diagram job, retrying full generation");
            let retry = format!("{question}{DIAGRAM_RETRY_SUFFIX}");
            self.answer(&retry, &[])
                .await
                .and_then(|a| a.visualization)
                .ok_or_else(|| NO_DIAGRAM_PLAN.to_string())
        })
    }
}

/// Entry point consumers talk to: answers, evaluation and diagram jobs.
///
/// Must be constructed inside a tokio runtime; the diagram worker pool is
/// spawned on creation.
pub struct TutorService {
    pipeline: Arc<AnswerPipeline>,
    checker: SymbolicChecker,
    web: Arc<WebEnricher>,
    metrics: Arc<AgentMetricsRegistry>,
    jobs: DiagramJobManager,
}

impl TutorService {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(config, TutorDeps::from_config(config)?)
    }

    pub fn new(config: &Config, deps: TutorDeps) -> anyhow::Result<Self> {
        let prompts = Arc::new(PromptBook::new().context("failed to compile prompt templates")?);
        let settings = config.tutor.clone();
        let planner = TutorPlanner::new(
            deps.engine.clone(),
            Arc::clone(&prompts),
            settings.planner_history_window,
        );
        let coordinator = MultiAgentCoordinator::new(
            deps.engine,
            planner.clone(),
            prompts,
            Arc::clone(&deps.web),
            Arc::clone(&deps.metrics),
            settings.history_window,
        );
        let pipeline = Arc::new(AnswerPipeline {
            settings,
            planner,
            coordinator,
            cache: AnswerCache::from_config(&config.cache),
            resolver: VisualizationResolver::new(deps.executor),
        });
        let renderer: Arc<dyn DiagramRenderer> = pipeline.clone();
        let jobs = DiagramJobManager::from_config(renderer, &config.jobs);

        Ok(Self {
            pipeline,
            checker: deps.checker,
            web: deps.web,
            metrics: deps.metrics,
            jobs,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.pipeline.settings.enabled
    }

    /// `None` means "not available": disabled, no model, or no usable plan.
    pub async fn answer(&self, question: &str, history: &[HistoryTurn]) -> Option<TutorAnswer> {
        self.pipeline.answer(question, history).await
    }

    pub fn question_requests_visualization(&self, question: &str) -> bool {
        crate::visualization::question_requests_visualization(question)
    }

    /// Deterministic recipe for visual questions, skipping generation.
    pub async fn fallback_visualization(&self, question: &str) -> Option<VisualizationPayload> {
        self.pipeline.resolver.fallback(question).await
    }

    pub async fn enrich_with_web_context(&self, question: &str, answer: &str) -> String {
        self.web.enrich(question, answer).await
    }

    pub fn evaluate(&self, question: &str, solution: &str) -> StructuredExplanation {
        didactics::build_structured_explanations(&self.checker, question, solution)
    }

    pub fn self_correction(&self, question: &str, checks: &[Check]) -> Option<String> {
        didactics::build_self_correction(&self.checker, question, checks)
    }

    pub fn checker(&self) -> &SymbolicChecker {
        &self.checker
    }

    pub fn cache(&self) -> &AnswerCache {
        &self.pipeline.cache
    }

    /// Known agents in pipeline order with their current metrics.
    pub fn agent_metrics(&self) -> Vec<(&'static str, AgentMetric)> {
        self.metrics.known()
    }

    pub fn start_diagram_job(&self, question: &str) -> Result<DiagramJob, JobError> {
        self.jobs.submit(question)
    }

    pub fn get_diagram_job(&self, id: &str) -> DiagramJob {
        self.jobs.get(id)
    }

    pub fn list_diagram_jobs(&self, limit: usize) -> Vec<DiagramJob> {
        self.jobs.list(limit)
    }

    pub fn delete_diagram_job(&self, id: &str) -> bool {
        self.jobs.delete(id).is_ok()
    }

    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
    }
}

/// Leading paragraphs that fit in `max_chars`; a hard cut with `...` when
/// even the first paragraph is too long.
pub fn trim_for_fast_mode(solution: &str, max_chars: usize) -> String {
    let trimmed = solution.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }

    let mut kept = Vec::new();
    let mut total = 0;
    for part in trimmed.split("\n\n") {
        let cost = part.chars().count() + 2;
        if total + cost > max_chars {
            break;
        }
        kept.push(part);
        total += cost;
    }
    let joined = kept.join("\n\n");
    let joined = joined.trim();
    if joined.is_empty() {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        joined.to_string()
    }
}
