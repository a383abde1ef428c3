// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;

// ── Engine + factory ────────────────────────────────────────────────────────
pub mod engine;
pub mod factory;

// ── Provider implementations ────────────────────────────────────────────────
pub mod compatible;
pub mod ollama;
pub mod ollama_cli;
pub mod scripted;

pub use compatible::OpenAiCompatibleProvider;
pub use engine::{Generation, GenerationEngine};
pub use factory::create_provider;
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use ollama_cli::OllamaCliProvider;
pub use scripted::ScriptedProvider;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::Provider;
