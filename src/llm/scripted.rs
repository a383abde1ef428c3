//! Provider that answers from a closure instead of a model runtime.
//!
//! Used for offline runs and by tests that need deterministic completions.

use super::engine::GenerationEngine;
use super::traits::Provider;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Responder = Box<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

// ScriptedProvider — closure-backed completions with a prompt log
pub struct ScriptedProvider {
    responder: Responder,
    available: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responder: impl Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            available: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reports itself unavailable, so engines never call it.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(|_| anyhow::bail!("unavailable provider called"))
        }
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn engine(self: &Arc<Self>, timeout: Duration) -> GenerationEngine {
        GenerationEngine::new(Arc::clone(self) as Arc<dyn Provider>, timeout)
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        let reply = (self.responder)(prompt);
        Box::pin(async move { reply })
    }
}
