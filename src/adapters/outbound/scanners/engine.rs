use crate::shared::Result;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default wall-clock limit for one engine invocation
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(600);

/// Longest stderr excerpt carried into an error message
const STDERR_EXCERPT_CHARS: usize = 2000;

/// How to invoke a scanner engine binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub binary: String,
    pub timeout: Duration,
}

impl EngineSettings {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

/// Runs an engine to completion and returns its stdout.
///
/// The child is killed when the timeout elapses. Spawn failure, timeout,
/// and a non-zero exit status are errors carrying the engine's stderr.
pub async fn run_engine(settings: &EngineSettings, args: &[OsString]) -> Result<Vec<u8>> {
    debug!(binary = %settings.binary, ?args, "Starting scanner engine");

    let mut command = Command::new(&settings.binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(settings.timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => anyhow::bail!("failed to start '{}': {}", settings.binary, e),
        Err(_) => anyhow::bail!(
            "'{}' timed out after {}s",
            settings.binary,
            settings.timeout.as_secs()
        ),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
        anyhow::bail!(
            "'{}' exited with {}: {}",
            settings.binary,
            output.status,
            excerpt
        );
    }

    debug!(
        binary = %settings.binary,
        bytes = output.stdout.len(),
        "Scanner engine finished"
    );
    Ok(output.stdout)
}
