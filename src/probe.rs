//! Agent process liveness probe.

use tokio::process::Command;

/// Whether a process matching the pattern is currently running.
///
/// Shells out to `pgrep -f`; any failure to run the probe reads as "not
/// running" rather than an error.
pub async fn agent_running(pattern: &str) -> bool {
    match Command::new("pgrep").arg("-f").arg(pattern).output().await {
        Ok(output) => output.status.success(),
        Err(e) => {
            tracing::debug!(error = %e, "pgrep unavailable");
            false
        }
    }
}
