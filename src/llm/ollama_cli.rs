use super::traits::Provider;
use anyhow::Context;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

const MAX_STDERR_CHARS: usize = 400;

/// Runs `ollama run <model>` with the prompt on stdin.
pub struct OllamaCliProvider {
    binary: String,
    model: String,
}

impl OllamaCliProvider {
    pub fn new(model: &str) -> Self {
        Self::with_binary("ollama", model)
    }

    pub fn with_binary(binary: &str, model: &str) -> Self {
        Self {
            binary: binary.to_string(),
            model: model.to_string(),
        }
    }

    async fn run(&self, prompt: &str) -> anyhow::Result<String> {
        let mut child = tokio::process::Command::new(&self.binary)
            .arg("run")
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.binary))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .context("failed to write prompt to ollama stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("failed to wait for ollama")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.chars().take(MAX_STDERR_CHARS).collect();
            anyhow::bail!("ollama run exited with {}: {stderr}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// True when `binary` resolves to a file, either directly or via `PATH`.
pub(crate) fn binary_on_path(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file())
    })
}

impl Provider for OllamaCliProvider {
    fn name(&self) -> &str {
        "ollama-cli"
    }

    fn is_available(&self) -> bool {
        binary_on_path(&self.binary)
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(self.run(prompt))
    }
}
