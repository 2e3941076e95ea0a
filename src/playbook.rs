//! Configuration-management playbook runner.
//!
//! Hosts are prepared and receive files through `ansible-playbook`. Each
//! environment ships two inventories next to the playbooks:
//! `<env>-inventory.sh` and `<env>-inventory-no-volumes.sh`. The latter is
//! used when bootstrapping a host, before any volume exists to inventory.

use crate::env::ansible;
use crate::executor::{CommandExecutor, ExecutionCommand, ExecutorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Playbook runner errors.
#[derive(Debug, thiserror::Error)]
pub enum PlaybookError {
    /// Playbook runner exited with a nonzero status
    #[error("Playbook {playbook} failed with exit code {exit_code}: {stderr}")]
    Failed {
        playbook: String,
        exit_code: i32,
        stderr: String,
    },

    /// Process could not be run
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}

/// The playbooks this tool knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybookKind {
    /// Bootstrap a fresh host
    InitHost,
    /// Upload files into the host's volumes
    UploadFiles,
}

impl PlaybookKind {
    /// Playbook file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybookKind::InitHost => "init-host",
            PlaybookKind::UploadFiles => "upload-files",
        }
    }

    /// Whether the volume inventory must be skipped for this playbook.
    pub fn skips_volumes(&self) -> bool {
        matches!(self, PlaybookKind::InitHost)
    }
}

impl std::fmt::Display for PlaybookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playbook runner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybookConfig {
    /// `ansible-playbook` binary
    pub playbook_binary: String,
    /// Directory holding inventories and playbooks
    pub directory: PathBuf,
}

impl Default for PlaybookConfig {
    fn default() -> Self {
        Self {
            playbook_binary: ansible::DEFAULT_PLAYBOOK_BINARY.to_string(),
            directory: PathBuf::from(ansible::DEFAULT_DIRECTORY),
        }
    }
}

/// Runs playbooks against an environment's inventory.
pub struct PlaybookRunner {
    executor: Arc<dyn CommandExecutor>,
    config: PlaybookConfig,
}

impl PlaybookRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: PlaybookConfig) -> Self {
        Self { executor, config }
    }

    /// Inventory script for `environment_name` and `kind`.
    pub fn inventory_path(&self, environment_name: &str, kind: PlaybookKind) -> PathBuf {
        let script = if kind.skips_volumes() {
            format!("{}-inventory-no-volumes.sh", environment_name)
        } else {
            format!("{}-inventory.sh", environment_name)
        };
        self.config.directory.join(script)
    }

    /// Playbook file for `kind`.
    pub fn playbook_path(&self, kind: PlaybookKind) -> PathBuf {
        self.config.directory.join(format!("{}.yaml", kind))
    }

    /// Run `kind` against the inventory of `environment_name`.
    ///
    /// Host-key verification is disabled for this invocation only.
    ///
    /// # Errors
    ///
    /// Returns error if the runner cannot be started or exits nonzero.
    pub async fn run(
        &self,
        environment_name: &str,
        kind: PlaybookKind,
    ) -> Result<String, PlaybookError> {
        let inventory = self.inventory_path(environment_name, kind);
        let playbook = self.playbook_path(kind);

        info!("Running playbook {} against {}", kind, environment_name);
        debug!("Inventory: {:?}, playbook: {:?}", inventory, playbook);

        let command = ExecutionCommand::new(
            self.config.playbook_binary.clone(),
            vec![
                "-i".to_string(),
                path_arg(&inventory),
                path_arg(&playbook),
            ],
        )
        .with_env(ansible::HOST_KEY_CHECKING_VAR, "False");

        let result = self.executor.execute(command).await?;
        if !result.success() {
            return Err(PlaybookError::Failed {
                playbook: kind.to_string(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(result.stdout)
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
