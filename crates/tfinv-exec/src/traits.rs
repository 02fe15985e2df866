//! Command executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs a command and captures its output.
///
/// A non-zero exit status is not an error at this layer; callers inspect
/// the returned [`CommandResult`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError>;

    async fn run_with_timeout(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    fn executor_type(&self) -> &'static str;
}
