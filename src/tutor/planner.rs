use super::plan_parser::{self, ParsedPlan};
use super::prompts::{PromptBook, format_history};
use super::types::{HistoryTurn, Plan};
use crate::llm::GenerationEngine;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single-shot path: one generation call, parsed into a [`Plan`].
#[derive(Clone)]
pub struct TutorPlanner {
    engine: GenerationEngine,
    prompts: Arc<PromptBook>,
    history_window: usize,
}

impl TutorPlanner {
    pub fn new(engine: GenerationEngine, prompts: Arc<PromptBook>, history_window: usize) -> Self {
        Self {
            engine,
            prompts,
            history_window,
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    pub async fn plan(&self, question: &str, history: &[HistoryTurn]) -> Option<Plan> {
        if !self.engine.is_available() {
            return None;
        }

        let history_block = format_history(history, self.history_window);
        let prompt = match self.prompts.planner(question, &history_block) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("failed to render planner prompt: {e:#}");
                return None;
            }
        };

        let Some(raw) = self.engine.generate(&prompt).await.into_text() else {
            warn!("planner received no output from the model");
            return None;
        };

        match plan_parser::parse(&raw) {
            Ok(parsed) => {
                let stage = match &parsed {
                    ParsedPlan::Structured(_) => "structured",
                    ParsedPlan::Loose(_) => "loose",
                    ParsedPlan::RawFallback(_) => "raw",
                };
                debug!(stage, "parsed tutor plan");
                Some(parsed.into_plan())
            }
            Err(e) => {
                warn!("failed to parse tutor plan: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;
    use std::time::Duration;

    fn planner(provider: &Arc<ScriptedProvider>) -> TutorPlanner {
        TutorPlanner::new(
            provider.engine(Duration::from_secs(5)),
            Arc::new(PromptBook::new().unwrap()),
            10,
        )
    }

    #[tokio::test]
    async fn structured_reply_becomes_plan() {
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Ok(r#"{"solution": "x = 3", "needs_visualization": false}"#.into())
        }));
        let plan = planner(&provider).plan("Solve x - 3 = 0", &[]).await.unwrap();
        assert_eq!(plan.solution, "x = 3");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn history_is_windowed_into_prompt() {
        let provider = Arc::new(ScriptedProvider::new(|_| Ok("plain answer".into())));
        let history: Vec<HistoryTurn> = (0..12)
            .map(|i| HistoryTurn::new("user", &format!("message {i}")))
            .collect();
        let plan = planner(&provider).plan("next?", &history).await.unwrap();
        assert_eq!(plan.solution, "plain answer");

        let prompt = provider.prompts()[0].clone();
        assert!(!prompt.contains("message 1\n"));
        assert!(prompt.contains("User: message 2\n"));
        assert!(prompt.contains("User: message 11\n\nQuestion: next?"));
    }

    #[tokio::test]
    async fn unavailable_engine_short_circuits() {
        let provider = Arc::new(ScriptedProvider::unavailable());
        assert!(planner(&provider).plan("q", &[]).await.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_generation_yields_none() {
        let provider = Arc::new(ScriptedProvider::new(|_| anyhow::bail!("connection refused")));
        assert!(planner(&provider).plan("q", &[]).await.is_none());
    }
}
