use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the tutor engine.
///
/// Each subsystem defines its own error variant. Pipeline boundaries turn
/// these into degraded values (fewer sections, `warn` checks, no
/// visualization); only the total absence of an answer reaches callers.
#[derive(Debug, Error)]
pub enum TutorError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generation port ─────────────────────────────────────────────────
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),

    // ── Plan parsing ────────────────────────────────────────────────────
    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    // ── Symbolic backend ────────────────────────────────────────────────
    #[error("symbolic: {0}")]
    Symbolic(#[from] SymbolicError),

    // ── Visualization sandbox ───────────────────────────────────────────
    #[error("visualization: {0}")]
    Visualization(#[from] VisualizationError),

    // ── Web retrieval ───────────────────────────────────────────────────
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),

    // ── Diagram jobs ────────────────────────────────────────────────────
    #[error("job: {0}")]
    Job(#[from] JobError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Generation port errors ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("provider {provider} is not available")]
    Unavailable { provider: String },

    #[error("provider {provider} timed out after {secs}s")]
    TimedOut { provider: String, secs: u64 },

    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} returned no output")]
    EmptyOutput { provider: String },
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

// ─── Plan errors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("completion is empty")]
    EmptyCompletion,
}

// ─── Symbolic backend errors ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolicError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("symbolic backend unavailable")]
    Unavailable,
}

// ─── Visualization errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("visualization source is empty")]
    EmptySource,

    #[error("missing required entry point {0}")]
    MissingEntryPoint(String),

    #[error("renderer timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("renderer failed: {diagnostics}")]
    Failed { diagnostics: String },

    #[error("renderer produced no output: {0}")]
    MissingOutput(String),

    #[error("renderer output is invalid: {0}")]
    InvalidOutput(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl VisualizationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ─── Retrieval errors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("web retrieval is disabled")]
    Disabled,
}

// ─── Diagram job errors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("diagram job not found: {0}")]
    NotFound(String),

    #[error("diagram worker pool is closed")]
    PoolClosed,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, TutorError>;
