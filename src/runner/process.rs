//! Process-backed command runner

use super::{CommandRunner, Invocation};
use async_trait::async_trait;
use std::process::ExitStatus;
use tracing::debug;

/// Spawns real processes with stdin, stdout and stderr inherited, so the
/// tool's output reaches the terminal live
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        debug!("Running: {}", invocation);

        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .await?;

        let code = exit_code(status);
        debug!("{} exited with status {}", invocation.program, code);
        Ok(code)
    }
}

/// Exit code of a finished process; signals map to 128 + signal number
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_exit_code() {
        let code = ProcessRunner::new()
            .run(&Invocation::new("true"))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_failure_exit_code_passed_through() {
        let code = ProcessRunner::new()
            .run(&Invocation::new("sh").args(["-c", "exit 7"]))
            .await
            .unwrap();
        assert_eq!(code, 7);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = ProcessRunner::new()
            .run(&Invocation::new("/nonexistent/kind"))
            .await;
        assert!(result.is_err());
    }
}
