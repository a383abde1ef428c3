use crate::error::VisualizationError;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

/// Diagnostics longer than this are cut before they reach callers or logs.
pub const MAX_DIAGNOSTIC_CHARS: usize = 400;

/// Environment variables passed through to renderer processes.
/// Only functional variables are included -- never API keys or secrets.
const SAFE_ENV_VARS: &[&str] = &[
    "PATH", "HOME", "TERM", "LANG", "LC_ALL", "LC_CTYPE", "USER", "SHELL",
];

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<(), VisualizationError>> + Send + 'a>>;

/// Runs a renderer script inside a scratch directory.
///
/// Implementations must leave every artifact inside `workdir`; the executor
/// collects outputs from there after a successful run.
pub trait ScriptRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
        workdir: &'a Path,
        timeout: Duration,
    ) -> RunFuture<'a>;
}

/// Child-process runner with a scrubbed environment and a hard deadline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub const fn new() -> Self {
        Self
    }
}

impl ScriptRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
        workdir: &'a Path,
        timeout: Duration,
    ) -> RunFuture<'a> {
        Box::pin(async move {
            let mut cmd = tokio::process::Command::new(program);
            cmd.args(args)
                .current_dir(workdir)
                .env_clear()
                .kill_on_drop(true);

            for var in SAFE_ENV_VARS {
                if let Ok(val) = std::env::var(var) {
                    cmd.env(var, val);
                }
            }
            // Keep renderer scratch files (and matplotlib/manim caches) in the job dir.
            cmd.env("TMPDIR", workdir);
            cmd.env("MPLCONFIGDIR", workdir);

            tracing::debug!(program, ?args, workdir = %workdir.display(), "spawning renderer");

            match tokio::time::timeout(timeout, cmd.output()).await {
                Ok(Ok(output)) if output.status.success() => Ok(()),
                Ok(Ok(output)) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    let text = if stderr.trim().is_empty() {
                        stdout
                    } else {
                        stderr
                    };
                    Err(VisualizationError::Failed {
                        diagnostics: truncate_diagnostics(text.trim()),
                    })
                }
                Ok(Err(e)) => Err(VisualizationError::Io(e)),
                Err(_) => Err(VisualizationError::Timeout {
                    secs: timeout.as_secs(),
                }),
            }
        })
    }
}

/// Keep the tail of the message, which carries the actual exception.
pub fn truncate_diagnostics(text: &str) -> String {
    if text.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return text.to_string();
    }
    let skip = text.chars().count() - MAX_DIAGNOSTIC_CHARS;
    text.chars().skip(skip).collect()
}
