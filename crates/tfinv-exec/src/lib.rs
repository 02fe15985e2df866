//! tfinv-exec: Local process execution abstraction
//!
//! Provides the executor trait used to shell out to terraform, and a
//! `tokio::process` backed implementation

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::CommandSpec;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
