use super::executor::VisualizationExecutor;
use super::recipes::VisualizationPlanner;
use super::question_requests_visualization;
use crate::tutor::types::{Plan, VisualizationPayload};
use std::sync::Arc;

/// Picks and renders the visualization for an answer.
///
/// Order: the plan's own request, then a deterministic recipe when the
/// question asked for a picture or touches a visual topic, then nothing.
pub struct VisualizationResolver {
    planner: VisualizationPlanner,
    executor: Arc<VisualizationExecutor>,
}

impl VisualizationResolver {
    pub fn new(executor: Arc<VisualizationExecutor>) -> Self {
        Self {
            planner: VisualizationPlanner::new(),
            executor,
        }
    }

    pub fn executor(&self) -> &Arc<VisualizationExecutor> {
        &self.executor
    }

    pub fn wants_fallback(&self, question: &str) -> bool {
        question_requests_visualization(question) || self.planner.is_visual_topic(question)
    }

    pub async fn resolve(&self, plan: &Plan, question: &str) -> Option<VisualizationPayload> {
        if plan.needs_visualization
            && let Some(request) = &plan.visualization
        {
            if let Some(payload) = self.executor.execute(request).await {
                return Some(payload);
            }
            tracing::debug!("planned visualization failed, trying recipe");
        }
        self.fallback(question).await
    }

    /// Deterministic recipe path, used on its own when no plan exists.
    pub async fn fallback(&self, question: &str) -> Option<VisualizationPayload> {
        if !self.wants_fallback(question) {
            return None;
        }
        let recipe = self.planner.plan(question)?;
        tracing::debug!(goal = %recipe.goal, "rendering fallback recipe");
        self.executor.execute(&recipe).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::types::{VisualizationKind, VisualizationRequest};
    use crate::visualization::executor::tests::{Behavior, FakeRunner, executor};
    use crate::visualization::recipes::Recipe;

    fn resolver(runner: Arc<FakeRunner>, media: &std::path::Path) -> VisualizationResolver {
        VisualizationResolver::new(Arc::new(executor(runner, media)))
    }

    fn plan_with(code: &str) -> Plan {
        let mut plan = Plan::text_only("answer");
        plan.needs_visualization = true;
        plan.visualization = Some(VisualizationRequest {
            kind: VisualizationKind::Chart,
            goal: "Model chart".into(),
            parameters: Default::default(),
            code: Some(code.into()),
        });
        plan
    }

    #[tokio::test]
    async fn planned_request_wins_when_it_renders() {
        let media = tempfile::tempdir().unwrap();
        let runner = FakeRunner::chart();
        let r = resolver(runner.clone(), media.path());
        let payload = r
            .resolve(&plan_with("fig = go.Figure()  # model"), "parabola")
            .await
            .unwrap();
        assert_eq!(payload.title, "Model chart");
        assert_eq!(runner.run_count(), 1);
    }

    #[tokio::test]
    async fn parabola_fallback_always_runs_the_same_recipe() {
        let media = tempfile::tempdir().unwrap();
        let runner = FakeRunner::chart();
        let r = resolver(runner.clone(), media.path());

        for _ in 0..3 {
            let payload = r
                .resolve(&Plan::text_only("no picture"), "Sketch a parabola")
                .await
                .unwrap();
            assert_eq!(payload.title, Recipe::Parabola.goal());
        }
        let scripts = runner.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 3);
        assert!(scripts.iter().all(|s| s.contains(Recipe::Parabola.source())));
    }

    #[tokio::test]
    async fn unrelated_question_gets_nothing() {
        let media = tempfile::tempdir().unwrap();
        let runner = FakeRunner::chart();
        let r = resolver(runner.clone(), media.path());
        assert!(r.fallback("Who was Euclid?").await.is_none());
        assert_eq!(runner.run_count(), 0);
    }

    #[tokio::test]
    async fn explicit_request_without_recipe_gets_nothing() {
        let media = tempfile::tempdir().unwrap();
        let runner = FakeRunner::chart();
        let r = resolver(runner.clone(), media.path());
        assert!(r.wants_fallback("please plot the primes"));
        assert!(r.fallback("please plot the primes").await.is_none());
    }

    #[tokio::test]
    async fn failing_renderer_yields_none() {
        let media = tempfile::tempdir().unwrap();
        let r = resolver(FakeRunner::new(Behavior::Fail("boom".into())), media.path());
        assert!(
            r.resolve(&plan_with("fig = 1"), "parabola")
                .await
                .is_none()
        );
    }
}
