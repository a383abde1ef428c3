//! Chart and animation rendering in an isolated child process.

pub mod executor;
pub mod fallback;
pub mod recipes;
pub mod sandbox;

pub use executor::VisualizationExecutor;
pub use fallback::VisualizationResolver;
pub use recipes::{Recipe, VisualizationPlanner};
pub use sandbox::{ProcessRunner, ScriptRunner};

const REQUEST_TOKENS: &[&str] = &[
    "visualization",
    "visualise",
    "visualize",
    "plot",
    "graph",
    "animate",
    "animation",
];

/// Whether the learner explicitly asked for a picture.
pub fn question_requests_visualization(question: &str) -> bool {
    let lowered = question.to_lowercase();
    REQUEST_TOKENS.iter().any(|t| lowered.contains(t))
}
