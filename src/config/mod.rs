pub mod schema;

pub use schema::{
    CacheConfig, Config, JobsConfig, LlmConfig, TutorConfig, VisualizationConfig, WebConfig,
};
