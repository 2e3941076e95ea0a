//! Logical volume resolution.
//!
//! Definitions refer to storage by logical type (`content`, `ssh_key`, ...).
//! The volume manager maps each type to exactly one concrete engine volume
//! per host, creating it the first time the type is referenced. Volumes are
//! recognized by the [`VOLUME_TYPE_LABEL`](crate::env::VOLUME_TYPE_LABEL)
//! label they are created with, so the mapping survives across runs.

use crate::container::runner::{CommandRunner, EngineConfig};
use crate::container::{ContainerError, Result};
use crate::env;
use crate::environment::TargetEnvironment;
use crate::executor::CommandExecutor;
use dashmap::DashMap;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex is valid"));

/// A concrete engine volume backing one logical type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Engine-level volume name
    pub name: String,
    /// Logical type the volume backs
    pub volume_type: String,
}

/// Resolves logical volume types to engine volumes.
///
/// `get_or_create` is a check-then-create sequence against the engine, so
/// calls for the same environment and type are serialized through a per-key
/// async lock.
pub struct VolumeManager {
    executor: Arc<dyn CommandExecutor>,
    engine: EngineConfig,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl VolumeManager {
    /// Create a new volume manager.
    pub fn new(executor: Arc<dyn CommandExecutor>, engine: EngineConfig) -> Self {
        Self {
            executor,
            engine,
            locks: DashMap::new(),
        }
    }

    fn runner<'a>(&'a self, environment: &'a TargetEnvironment) -> CommandRunner<'a> {
        CommandRunner::new(self.executor.as_ref(), &self.engine, environment)
    }

    /// Return the volume backing `volume_type`, creating it if none exists.
    ///
    /// # Errors
    ///
    /// Returns error if the type is empty or an engine command fails.
    pub async fn get_or_create(
        &self,
        environment: &TargetEnvironment,
        volume_type: &str,
    ) -> Result<Volume> {
        if volume_type.is_empty() {
            return Err(ContainerError::InvalidDefinition(
                "volume type must not be empty".to_string(),
            ));
        }

        let lock = self
            .locks
            .entry(format!("{}/{}", environment.name, volume_type))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(volume) = self.find(environment, volume_type).await? {
            debug!("Reusing volume {} for type {}", volume.name, volume_type);
            return Ok(volume);
        }

        self.create(environment, volume_type).await
    }

    /// Look up the volume labelled with `volume_type`.
    ///
    /// # Errors
    ///
    /// Returns error if listing volumes fails.
    pub async fn find(
        &self,
        environment: &TargetEnvironment,
        volume_type: &str,
    ) -> Result<Option<Volume>> {
        let output = self
            .runner(environment)
            .args(["volume", "ls", "--quiet", "--filter"])
            .arg(format!("label={}={}", env::VOLUME_TYPE_LABEL, volume_type))
            .execute()
            .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|name| Volume {
                name: name.to_string(),
                volume_type: volume_type.to_string(),
            }))
    }

    async fn create(&self, environment: &TargetEnvironment, volume_type: &str) -> Result<Volume> {
        let name = volume_name_for(volume_type);

        let output = self
            .runner(environment)
            .args(["volume", "create", "--label"])
            .arg(format!("{}={}", env::VOLUME_TYPE_LABEL, volume_type))
            .arg(name.as_str())
            .execute()
            .await?;

        let name = if output.is_empty() { name } else { output };
        info!("Created volume {} for type {}", name, volume_type);

        Ok(Volume {
            name,
            volume_type: volume_type.to_string(),
        })
    }
}

/// Generate a fresh engine volume name for `volume_type`.
pub fn volume_name_for(volume_type: &str) -> String {
    let sanitized = INVALID_NAME_CHARS.replace_all(volume_type, "_");
    let prefix = match sanitized.trim_start_matches(['_', '.', '-']) {
        "" => "volume",
        prefix => prefix,
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &suffix[..8])
}
