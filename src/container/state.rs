//! Observed container state.
//!
//! Mirrors the subset of `container inspect` output this crate reads. The
//! engine owns this data; it is surfaced verbatim and never interpreted
//! beyond existence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine-reported run status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Process state of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RunState {
    pub status: ContainerStatus,
    pub running: bool,
    pub paused: bool,
    pub restarting: bool,
    pub dead: bool,
    pub pid: i64,
    pub exit_code: i64,
    pub error: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A mount as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountPoint {
    #[serde(rename = "Type")]
    pub mount_type: String,
    /// Volume name, for volume mounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: String,
    pub destination: String,
}

/// Creation-time configuration snapshot.
///
/// The engine emits `null` for empty collections, hence the options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConfigSnapshot {
    pub hostname: String,
    pub exposed_ports: Option<HashMap<String, serde_json::Value>>,
    pub env: Option<Vec<String>>,
    pub cmd: Option<Vec<String>>,
    pub image: String,
    pub volumes: Option<HashMap<String, serde_json::Value>>,
    pub entrypoint: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
}

/// Observed state of one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub id: String,
    /// Name as the engine reports it, with a leading `/`
    pub name: String,
    #[serde(default)]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub state: RunState,
    #[serde(default)]
    pub restart_count: u32,
    #[serde(default)]
    pub mounts: Vec<MountPoint>,
    #[serde(default)]
    pub config: ConfigSnapshot,
}

impl ContainerState {
    /// Container name without the engine's leading `/`.
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }

    /// Label value from the config snapshot.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.config
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    /// Parse `container inspect` output and take its first element.
    ///
    /// Returns `None` for an empty array or output that is not an inspect
    /// array at all.
    pub fn from_inspect_output(output: &str) -> Option<Self> {
        serde_json::from_str::<Vec<ContainerState>>(output)
            .ok()?
            .into_iter()
            .next()
    }
}
