#[path = "tutor/support.rs"]
mod support;

#[path = "tutor/answer_flow.rs"]
mod answer_flow;
#[path = "tutor/checks.rs"]
mod checks;
#[path = "tutor/diagram_jobs.rs"]
mod diagram_jobs;
#[path = "tutor/plan_parsing.rs"]
mod plan_parsing;
#[path = "tutor/web_notes.rs"]
mod web_notes;
