//! Result types for command execution

use std::time::Duration;

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status code (0 for success, -1 when killed by a signal)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Check if the command wrote anything at all to stderr
    #[must_use]
    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: i32, stderr: &str) -> CommandResult {
        CommandResult {
            status,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_success() {
        assert!(result(0, "").success());
        assert!(!result(1, "").success());
    }

    #[test]
    fn test_has_stderr_counts_whitespace() {
        assert!(!result(0, "").has_stderr());
        assert!(result(0, " \n").has_stderr());
        assert!(result(0, "Error: no state\n").has_stderr());
    }
}
