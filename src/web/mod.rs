//! Optional web retrieval used to enrich long-tail answers.

pub mod enricher;
pub mod retrieval;

pub use enricher::{WebEnricher, clean_query};
pub use retrieval::{RetrievalBackend, Snippet, WikipediaBackend};
