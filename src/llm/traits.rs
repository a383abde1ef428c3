use std::future::Future;
use std::pin::Pin;

/// A text-completion capability backed by a language-model runtime.
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "ollama", "openai-compatible").
    fn name(&self) -> &str;

    /// Cheap local probe; callers skip `complete` when this is false.
    fn is_available(&self) -> bool {
        true
    }

    /// Complete `prompt`, returning the raw model text.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}
