use euclid_tutor::PlanError;
use euclid_tutor::tutor::plan_parser::{ParsedPlan, parse};

#[test]
fn jsonish_model_output_always_yields_solution_text() {
    let outputs = [
        "```json\n{\"solution\": \"x = 4\", \"needs_visualization\": false}\n```",
        "Here you go: {\"solution\": \"Divide both sides by 3\", \"checks\": [",
        "{\"steps\": [{\"description\": \"Expand\"}, {\"description\": \"Collect terms\"}",
        "\"description\": \"Rotate the vector by 90 degrees\"",
        "{'solution': 'single quotes are not JSON'}",
        "{\"solution\": 42}",
    ];
    for raw in outputs {
        let plan = parse(raw)
            .unwrap_or_else(|e| panic!("{raw}: {e}"))
            .into_plan();
        assert!(!plan.solution.trim().is_empty(), "{raw}");
    }
}

#[test]
fn fenced_json_is_structured_not_fallback() {
    let parsed = parse("```json\n{\"solution\": \"x = 4\"}\n```").unwrap();
    assert!(matches!(parsed, ParsedPlan::Structured(_)));
    assert_eq!(parsed.plan().solution, "x = 4");
}

#[test]
fn blank_completion_is_the_only_error() {
    assert!(matches!(parse(""), Err(PlanError::EmptyCompletion)));
    assert!(parse("just words").unwrap().is_fallback());
}
