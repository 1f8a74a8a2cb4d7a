//! Bounded execution of external media tools.

use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found; install it or set its path in the config")]
    NotFound(String),
    #[error("{tool} timed out after {secs}s")]
    TimedOut { tool: String, secs: u64 },
    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `cmd` to completion with captured output, killing it if `timeout` elapses.
pub async fn run_tool(cmd: &mut Command, timeout: Duration) -> Result<Output, ToolError> {
    let tool = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(tool = %tool, args = ?cmd.as_std().get_args().collect::<Vec<_>>(), "Running tool");

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::NotFound(tool)),
        Ok(Err(source)) => Err(ToolError::Io { tool, source }),
        Err(_) => Err(ToolError::TimedOut {
            tool,
            secs: timeout.as_secs(),
        }),
    }
}

/// Last non-empty stderr line, or the exit status when stderr is silent.
pub fn stderr_summary(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("exited with {}", output.status))
}

/// True when tool stderr reports a local write failure.
pub fn is_disk_write_failure(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    [
        "no space left on device",
        "permission denied",
        "read-only file system",
        "disk quota exceeded",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}
