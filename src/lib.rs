#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::cast_precision_loss
)]

pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod observability;
pub mod symbolic;
pub mod tutor;
pub mod visualization;
pub mod web;

pub use config::Config;
pub use error::{
    ConfigError, GenerationError, JobError, PlanError, Result, RetrievalError, SymbolicError,
    TutorError, VisualizationError,
};
pub use tutor::{TutorAnswer, TutorService};
