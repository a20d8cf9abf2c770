//! Process execution primitives.

use serde::Serialize;
use std::process::{Command, Output};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl From<Output> for CommandOutput {
    fn from(out: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        }
    }
}

/// Run a program and capture its output regardless of exit status.
///
/// Only a failure to spawn the process is an error.
pub fn capture(program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
    Command::new(program).args(args).output().map(CommandOutput::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_failing_exit_code() {
        let output = capture("false", &[]).unwrap();
        assert!(!output.success);
        assert_ne!(output.exit_code, 0);
    }

    #[test]
    fn capture_reports_spawn_failure() {
        assert!(capture("nonexistent_command_xyz", &[]).is_err());
    }
}
