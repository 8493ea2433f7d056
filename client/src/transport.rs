//! Server subprocess ownership.
//!
//! The transport owns the one child process per client. The spawn runs
//! with the child's working directory set to the SDK root (the parent's
//! working directory is never touched) and, on Windows, with the flag
//! that suppresses the console window a piped child would otherwise pop.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::Error;
use anser_types::AnalyzerConfig;

const EXIT_WAIT: Duration = Duration::from_secs(2);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Resolve a configured executable to a runnable path.
///
/// Bare names go through a `PATH` lookup; anything containing a path
/// separator is taken as-is.
fn resolve_executable(command: &str) -> Result<PathBuf, Error> {
    if command.contains(std::path::is_separator) {
        return Ok(PathBuf::from(command));
    }
    which::which(command).map_err(|_| Error::ExecutableNotFound {
        command: command.to_string(),
    })
}

/// The external analysis-server instance.
///
/// Owned exclusively by the client; at most one live process per client.
pub(crate) struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    /// Spawn the server with stdio fully redirected.
    ///
    /// Fails with [`Error::Launch`] if the process cannot be started.
    pub fn spawn(config: &AnalyzerConfig) -> Result<(Self, ChildStdin, ChildStdout), Error> {
        let resolved = resolve_executable(&config.executable)?;

        let mut cmd = Command::new(&resolved);
        cmd.args(&config.args)
            .arg(format!("--sdk={}", config.sdk_path.display()))
            .current_dir(&config.sdk_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|source| Error::Launch {
            command: config.executable.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or(Error::TransportClosed)?;
        let stdout = child.stdout.take().ok_or(Error::TransportClosed)?;

        Ok((Self { child }, stdin, stdout))
    }

    /// Terminate the process, giving it a short grace period first.
    /// Idempotent: waiting on an exited child returns immediately.
    pub async fn stop(&mut self) {
        if tokio::time::timeout(EXIT_WAIT, self.child.wait())
            .await
            .is_err()
        {
            tracing::debug!("analysis server did not exit in time, killing");
            let _ = self.child.kill().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_missing_from_path_is_not_found() {
        let err = resolve_executable("definitely-not-a-real-analyzer-binary");
        assert!(matches!(err, Err(Error::ExecutableNotFound { .. })));
    }

    #[test]
    fn test_explicit_path_is_taken_as_is() {
        let path = resolve_executable("/opt/sdk/bin/analysis_server").unwrap();
        assert_eq!(path, PathBuf::from("/opt/sdk/bin/analysis_server"));
    }

    #[test]
    fn test_spawn_of_missing_executable_is_launch_error() {
        let config: AnalyzerConfig = serde_json::from_value(serde_json::json!({
            "executable": "/nonexistent/bin/analysis_server",
            "sdk_path": "/"
        }))
        .unwrap();
        // Needs a runtime because tokio::process registers with the reactor.
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        assert!(matches!(
            ServerProcess::spawn(&config),
            Err(Error::Launch { .. })
        ));
    }
}
