//! Container definition resolution and reconciliation.
//!
//! This module turns declared container definitions into running containers
//! on a target host by driving the engine's command-line interface. The
//! only comparison between desired and observed state is whether a container
//! with the definition's name exists.
//!
//! ## Architecture
//!
//! - [`definition`]: Declarative container definitions and sidecar derivation
//! - [`store`]: Loads definition documents from a directory
//! - [`state`]: Observed container state as reported by `container inspect`
//! - [`runner`]: Builds and executes one engine CLI invocation
//! - [`volume`]: Maps logical volume types to concrete engine volumes
//! - [`orchestrator`]: Sequential, idempotent create/delete over definition sets
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dockhand::container::{ContainerOrchestrator, DefinitionStore, EngineConfig};
//! use dockhand::environment::TargetEnvironment;
//! use dockhand::executor::HostExecutor;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = ContainerOrchestrator::new(
//!         DefinitionStore::new("containers"),
//!         Arc::new(HostExecutor::new()),
//!         EngineConfig::default(),
//!     );
//!     let env = TargetEnvironment::local("dev");
//!
//!     orchestrator.ensure_reverse_proxy(&env).await?;
//!     let states = orchestrator.create(&env, "blog").await?;
//!     for state in &states {
//!         println!("{} {}", state.display_name(), state.state.status);
//!     }
//!
//!     orchestrator.delete(&env, "blog").await?;
//!     Ok(())
//! }
//! ```

pub mod definition;
pub mod orchestrator;
pub mod runner;
pub mod state;
pub mod store;
pub mod volume;

pub use definition::{ContainerDefinition, PortBinding, SftpConfig, VolumeBinding};
pub use orchestrator::{ContainerOrchestrator, DeleteTarget, InspectOutcome};
pub use runner::{CommandRunner, EngineConfig};
pub use state::{ContainerState, ContainerStatus};
pub use store::DefinitionStore;
pub use volume::{Volume, VolumeManager};

use crate::environment::EnvironmentError;
use crate::executor::ExecutorError;
use std::path::PathBuf;

/// Container reconciliation errors.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Definition document or definitions directory is missing
    #[error("Container definition not found: {name} ({})", path.display())]
    DefinitionNotFound { name: String, path: PathBuf },

    /// Definition document is not valid JSON or does not match the schema
    #[error("Failed to parse container definition {name}: {source}")]
    DefinitionParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Definition is well-formed but cannot be acted on
    #[error("Invalid container definition: {0}")]
    InvalidDefinition(String),

    /// Engine CLI exited with a nonzero status
    #[error("Engine command `{command}` failed with exit code {exit_code}: {stderr}")]
    EngineExecution {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Container could not be found right after the engine reported creating it
    #[error("Container {0} is not visible after creation")]
    NotCreated(String),

    /// Process could not be run at all
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Target environment is misconfigured
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
