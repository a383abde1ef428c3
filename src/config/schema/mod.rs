mod cache;
mod core;
mod jobs;
mod llm;
mod tutor;
mod visualization;
mod web;

pub use cache::CacheConfig;
pub use core::Config;
pub use jobs::JobsConfig;
pub use llm::LlmConfig;
pub use tutor::TutorConfig;
pub use visualization::VisualizationConfig;
pub use web::WebConfig;
