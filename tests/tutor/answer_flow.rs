use super::support::{ChartRunner, PLAN_JSON, PLANNER_MARKER, harness, planner_then, scripted};
use euclid_tutor::observability::AgentStatus;
use euclid_tutor::tutor::VisualizationKind;
use euclid_tutor::visualization::Recipe;

#[tokio::test]
async fn repeated_question_is_served_from_cache() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |c| {
        c.tutor.multi_agent_enabled = false;
    });

    let first = h.service.answer("Explain eigenvalues", &[]).await.unwrap();
    let again = h.service.answer("explain   EIGENVALUES!!", &[]).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(h.runner.runs(), 1);
    assert_eq!(h.service.cache().len(), 1);
}

#[tokio::test]
async fn disabled_tutor_is_unavailable() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |c| {
        c.tutor.enabled = false;
    });
    assert!(h.service.answer("What is 2 + 2?", &[]).await.is_none());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn multi_agent_answer_appends_sections_and_records_metrics() {
    let h = harness(planner_then("A short note."), ChartRunner::ok(), |_| {});

    let answer = h.service.answer("Why does factoring work?", &[]).await.unwrap();
    let solution = &answer.solution;

    assert!(solution.starts_with("Set the factors to zero"));
    let order = [
        "**Intuition**",
        "**Examples**",
        "**Proof Sketch**",
        "**History**",
        "**Visualization Idea**",
    ];
    let positions: Vec<usize> = order.iter().map(|h| solution.find(h).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!solution.contains("**Web-Verified Notes**"));

    let metrics = h.service.agent_metrics();
    let status = |id: &str| metrics.iter().find(|(k, _)| *k == id).unwrap().1.status;
    assert_eq!(status("planner_agent"), AgentStatus::Ok);
    assert_eq!(status("proof_agent"), AgentStatus::Ok);
    assert_eq!(status("web_research_agent"), AgentStatus::Idle);
}

#[tokio::test]
async fn one_failing_agent_does_not_sink_the_answer() {
    let provider = scripted(|prompt| {
        if prompt.contains(PLANNER_MARKER) {
            Ok(PLAN_JSON.to_string())
        } else if prompt.contains("proof sketch") {
            anyhow::bail!("connection reset")
        } else {
            Ok("fine".to_string())
        }
    });
    let h = harness(provider, ChartRunner::ok(), |_| {});

    let answer = h.service.answer("Why does factoring work?", &[]).await.unwrap();
    assert!(answer.solution.contains("**History**"));
    assert!(!answer.solution.contains("**Proof Sketch**"));

    let proof = h
        .service
        .agent_metrics()
        .into_iter()
        .find(|(id, _)| *id == "proof_agent")
        .unwrap()
        .1;
    assert_eq!(proof.status, AgentStatus::Error);
    assert!(proof.last_error.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn fast_mode_trims_to_leading_paragraphs() {
    let provider = scripted(|_| {
        Ok(r#"{"solution": "First paragraph.\n\nSecond paragraph.\n\nA third paragraph that is far too long to fit.", "needs_visualization": false}"#.to_string())
    });
    let h = harness(provider, ChartRunner::ok(), |c| {
        c.tutor.fast_mode_enabled = true;
        c.tutor.fast_mode_max_chars = 40;
    });

    let answer = h.service.answer("Define a group.", &[]).await.unwrap();
    assert_eq!(answer.solution, "First paragraph.\n\nSecond paragraph.");
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn parabola_fallback_is_the_same_recipe_every_time() {
    let mut seen = Vec::new();
    for question in ["Sketch a parabola", "Sketch a parabola", "Sketch a parabola"] {
        let h = harness(planner_then("unused"), ChartRunner::ok(), |c| {
            c.tutor.multi_agent_enabled = false;
        });
        let payload = h.service.answer(question, &[]).await.unwrap().visualization.unwrap();
        assert_eq!(payload.kind, VisualizationKind::Chart);
        assert_eq!(payload.title, Recipe::Parabola.goal());
        assert!(payload.id.starts_with("plotly-"));
        seen.push((payload.title, payload.data));
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn broken_renderer_leaves_text_answer_intact() {
    let h = harness(planner_then("unused"), ChartRunner::failing(), |c| {
        c.tutor.multi_agent_enabled = false;
    });
    let answer = h.service.answer("Sketch a parabola", &[]).await.unwrap();
    assert!(answer.visualization.is_none());
    assert!(answer.solution.contains("x = 2"));
    assert_eq!(h.runner.runs(), 1);
}

#[tokio::test]
async fn question_keywords_request_visualization() {
    let h = harness(planner_then("unused"), ChartRunner::ok(), |_| {});
    assert!(h.service.question_requests_visualization("Please plot sin(x)"));
    assert!(h.service.question_requests_visualization("Can you ANIMATE this?"));
    assert!(!h.service.question_requests_visualization("Prove that sqrt(2) is irrational"));
}
