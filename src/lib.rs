//! # Dockhand
//!
//! Reconciles a declared set of container definitions against the containers
//! running on a target host by driving the Docker command-line interface.
//!
//! ## Architecture Overview
//!
//! - **[`container`]**: Definition loading, sidecar derivation, volume
//!   resolution, command assembly and sequential create/delete
//! - **[`executor`]**: Process execution used for every engine invocation
//! - **[`environment`]**: Target hosts, their engine connection and URL aliases
//! - **[`playbook`]**: Host bootstrap and file upload through `ansible-playbook`
//! - **[`cli`]**: Argument parsing and configuration discovery
//!
//! ## Reconciliation Model
//!
//! Desired state is a JSON definition document per container name; observed
//! state is whatever `docker container inspect` reports. The two are compared
//! by name only: a definition whose container exists is left alone, one whose
//! container is missing is created. Work within one call is strictly
//! sequential and never rolled back.
//!
//! ## Quick Start
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
//!
//!     let env = TargetEnvironment::local("dev").with_alias("blog.example.com", "blog.localhost");
//!     let states = orchestrator.create(&env, "blog").await?;
//!     println!("{} container(s) in place", states.len());
//!     Ok(())
//! }
//! ```

/// Container definition resolution and reconciliation.
pub mod container;

/// Process execution abstraction.
pub mod executor;

/// Target environment definitions.
pub mod environment;

/// Configuration-management playbook runner.
pub mod playbook;

/// Environment constants and path utilities.
///
/// Centralizes hardcoded names, reserved containers and sidecar parameters.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use container::{
    ContainerDefinition, ContainerError, ContainerOrchestrator, ContainerState, DefinitionStore,
    EngineConfig,
};
pub use environment::TargetEnvironment;
pub use executor::{CommandExecutor, HostExecutor};
