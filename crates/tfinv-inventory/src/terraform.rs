//! terraform client for fetching state

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tfinv_exec::{CommandExecutor, CommandSpec};
use tracing::{debug, instrument};

use crate::error::InventoryError;

/// Binary used when none is configured
pub const DEFAULT_BINARY: &str = "terraform";
/// Workspace used when none is configured
pub const DEFAULT_WORKSPACE: &str = "default";

/// Runs `terraform workspace select` and `terraform state pull`
///
/// Remote backends are handled by terraform itself, so whatever backend the
/// working directory is configured for is what gets read.
pub struct TerraformClient {
    /// Executor for running terraform
    executor: Arc<dyn CommandExecutor>,
    /// terraform binary name or path
    binary: String,
    /// Directory to run terraform in
    working_dir: Option<PathBuf>,
    /// Workspace to select before pulling
    workspace: String,
    /// Per-command timeout
    timeout: Option<Duration>,
}

impl TerraformClient {
    /// Create a client using `terraform` from `PATH` and the `default` workspace
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            binary: DEFAULT_BINARY.to_string(),
            working_dir: None,
            workspace: DEFAULT_WORKSPACE.to_string(),
            timeout: None,
        }
    }

    /// Set the terraform binary
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the directory terraform runs in
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the workspace
    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Set a per-command timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Workspace that will be selected
    #[must_use]
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Select the configured workspace
    ///
    /// # Errors
    /// Returns [`InventoryError::FetchFailure`] if terraform reports an error.
    pub async fn select_workspace(&self) -> Result<(), InventoryError> {
        self.run_checked(&["workspace", "select", self.workspace.as_str()])
            .await
            .map(|_| ())
    }

    /// Pull the current state as text
    ///
    /// # Errors
    /// Returns [`InventoryError::FetchFailure`] if terraform reports an error.
    pub async fn pull_state(&self) -> Result<String, InventoryError> {
        self.run_checked(&["state", "pull"]).await
    }

    /// Select the workspace, then pull its state
    ///
    /// # Errors
    /// Returns the first failure of either command.
    #[instrument(skip(self), fields(binary = %self.binary, workspace = %self.workspace))]
    pub async fn fetch_state(&self) -> Result<String, InventoryError> {
        self.select_workspace().await?;
        let state = self.pull_state().await?;
        debug!(bytes = state.len(), "state pulled");
        Ok(state)
    }

    fn command(&self, args: &[&str]) -> CommandSpec {
        let cmd = CommandSpec::new(&self.binary).args(args.iter().copied());
        match &self.working_dir {
            Some(dir) => cmd.current_dir(dir.clone()),
            None => cmd,
        }
    }

    /// Run a terraform subcommand and return its stdout
    ///
    /// Any stderr output, even whitespace, counts as failure regardless of exit status.
    async fn run_checked(&self, args: &[&str]) -> Result<String, InventoryError> {
        let cmd = self.command(args);
        debug!(command = %cmd, executor = self.executor.executor_type(), "running terraform");

        let result = match self.timeout {
            Some(timeout) => self.executor.run_with_timeout(&cmd, timeout).await?,
            None => self.executor.run(&cmd).await?,
        };

        if result.has_stderr() || !result.success() {
            let trimmed = result.stderr.trim();
            let stderr = if trimmed.is_empty() {
                format!("exited with status {}", result.status)
            } else {
                trimmed.to_string()
            };
            return Err(InventoryError::FetchFailure {
                command: cmd.to_string(),
                stderr,
            });
        }

        Ok(result.stdout)
    }
}
