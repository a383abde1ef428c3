//! Answer orchestration: planning, agent fan-out, caching and pedagogy.

pub mod agents;
pub mod coordinator;
pub mod didactics;
pub mod plan_parser;
pub mod planner;
pub mod prompts;
pub mod service;
pub mod types;

pub use agents::AgentId;
pub use didactics::{ExplanationMode, LearnerLevel, LearningAids, StructuredExplanation};
pub use service::{TutorDeps, TutorService};
pub use types::{
    Check, CheckStatus, HistoryTurn, Plan, TutorAnswer, VisualizationKind, VisualizationPayload,
    VisualizationRequest,
};
