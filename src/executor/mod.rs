//! # Process Execution Layer
//!
//! Runs external programs (the container engine CLI, the playbook runner) on
//! the local machine and captures their output.
//!
//! ## Core Components
//!
//! - **[`CommandExecutor`]**: Async trait every executor implements
//! - **[`HostExecutor`]**: Spawns processes via `tokio::process::Command`
//! - **[`ExecutionCommand`]**: Program, arguments, environment and optional timeout
//! - **[`ExecutionResult`]**: Captured stdout, stderr, exit code and duration
//!
//! ## Execution Flow
//!
//! ```text
//! ExecutionCommand
//!        ↓
//!   CommandExecutor::execute()
//!        ↓
//!   HostExecutor ── tokio::process ──> docker / ansible-playbook
//!        ↓
//!  ExecutionResult
//! ```
//!
//! A nonzero exit code is *not* an executor error: the result is returned and
//! callers decide what a failure means for them. Executor errors are reserved
//! for processes that could not be spawned or that timed out.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dockhand::executor::{CommandExecutor, ExecutionCommand, HostExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = HostExecutor::new();
//!
//!     let command = ExecutionCommand::new("docker", vec!["version".to_string()]);
//!     let result = executor.execute(command).await?;
//!
//!     println!("Exit code: {}", result.exit_code);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Host-based command execution.
///
/// Implements [`HostExecutor`] for direct process execution on the
/// host system using `tokio::process::Command`.
pub mod host;

pub use host::HostExecutor;

/// Result of command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Exit code (0 = success, non-zero = failure)
    pub exit_code: i32,
    /// Duration of command execution
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command executed successfully (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command to execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionCommand {
    /// Program name or path to execute
    pub program: String,
    /// Command line arguments
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Maximum execution time (None = no timeout)
    pub timeout: Option<Duration>,
}

impl ExecutionCommand {
    /// Create a new command with just program and args
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: HashMap::new(),
            timeout: None,
        }
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Set execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Errors during command execution
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The program could not be found on `PATH`
    #[error("Binary not found: {0}")]
    BinaryNotFound(String),

    /// Command execution timed out
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Abstracts where and how external programs are run.
///
/// The orchestrator only ever talks to this trait, which lets tests swap in a
/// scripted executor instead of a real engine.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and return the captured result.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or times out.
    /// A nonzero exit code is reported through [`ExecutionResult::exit_code`].
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError>;

    /// Get executor type name for logging
    fn executor_type(&self) -> &'static str;
}
