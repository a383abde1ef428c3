use super::support::{ChartRunner, harness, planner_then};
use euclid_tutor::jobs::{DiagramJob, DiagramJobManager, DiagramRenderer, JobStatus, RenderFuture};
use euclid_tutor::tutor::{TutorService, VisualizationKind, VisualizationPayload};
use euclid_tutor::visualization::Recipe;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Renders only once a permit is released.
struct HeldRenderer {
    permits: Semaphore,
}

impl DiagramRenderer for HeldRenderer {
    fn render<'a>(&'a self, question: &'a str) -> RenderFuture<'a> {
        Box::pin(async move {
            let Ok(_permit) = self.permits.acquire().await else {
                return Err("renderer closed".to_string());
            };
            Ok(VisualizationPayload {
                id: "plotly-000000000000".into(),
                kind: VisualizationKind::Chart,
                title: question.to_string(),
                data: json!({"data": [], "layout": {}}),
            })
        })
    }
}

async fn settle(svc: &TutorService, id: &str) -> DiagramJob {
    for _ in 0..300 {
        let job = svc.get_diagram_job(id);
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never settled");
}

#[tokio::test]
async fn queued_job_never_reads_completed_before_pickup() {
    let renderer = Arc::new(HeldRenderer {
        permits: Semaphore::new(0),
    });
    let manager = DiagramJobManager::start(renderer.clone(), 1, 100);

    let job = manager.submit("parabola").unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.progress, 5);
    for _ in 0..20 {
        assert_ne!(manager.get(&job.id).status, JobStatus::Completed);
        tokio::task::yield_now().await;
    }

    renderer.permits.add_permits(1);
    let mut last = manager.get(&job.id);
    for _ in 0..300 {
        if last.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        last = manager.get(&job.id);
    }
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.progress, 100);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.get(&job.id), last);
    manager.shutdown().await;
}

#[tokio::test]
async fn recipe_topic_completes_without_the_model() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |_| {});
    let job = h.service.start_diagram_job("Show me a fraction").unwrap();
    assert!(job.id.starts_with("viz-"));

    let done = settle(&h.service, &job.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.visualization.unwrap().title, Recipe::Fractions.goal());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn topic_without_recipe_ends_in_error_after_one_retry() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |c| {
        c.tutor.multi_agent_enabled = false;
    });
    let job = h.service.start_diagram_job("Who was Hypatia?").unwrap();

    let failed = settle(&h.service, &job.id).await;
    assert_eq!(failed.status, JobStatus::Error);
    assert_eq!(
        failed.error.as_deref(),
        Some("No diagram plan available for this topic yet.")
    );
    let prompts = h.provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Who was Hypatia?. Provide a visualization."));
}

#[tokio::test]
async fn listing_and_deleting_jobs() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |_| {});
    let ids: Vec<String> = ["fraction one", "fraction two", "fraction three"]
        .iter()
        .map(|q| h.service.start_diagram_job(q).unwrap().id)
        .collect();

    let listed: Vec<String> = h.service.list_diagram_jobs(2).into_iter().map(|j| j.id).collect();
    assert_eq!(listed, vec![ids[2].clone(), ids[1].clone()]);
    assert_eq!(h.service.list_diagram_jobs(0).len(), 1);

    assert!(h.service.delete_diagram_job(&ids[0]));
    assert!(!h.service.delete_diagram_job(&ids[0]));
    let gone = h.service.get_diagram_job(&ids[0]);
    assert_eq!(gone.status, JobStatus::NotFound);
    assert_eq!(gone.error.as_deref(), Some("Diagram job not found"));
}
