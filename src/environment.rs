//! Target environment definitions.
//!
//! An environment names one host running the container engine, how to reach
//! it, and the alias table used to rewrite routing hosts. Environments are
//! supplied through configuration and consumed opaquely by anything that
//! runs a command against the host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// Schemes the engine CLI accepts for a remote daemon address.
const SUPPORTED_SCHEMES: [&str; 4] = ["tcp", "unix", "ssh", "npipe"];

/// Errors in an environment definition.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    /// Engine host is not a valid URL
    #[error("Invalid engine host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// Engine host uses a scheme the engine CLI does not understand
    #[error("Unsupported engine host scheme '{scheme}' in '{host}'")]
    UnsupportedScheme { host: String, scheme: String },
}

/// How to reach the engine daemon of a target host.
///
/// Unset fields leave the engine CLI on its own defaults (the local daemon).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConnection {
    /// Daemon address, e.g. `tcp://10.0.0.5:2376` or `ssh://deploy@host`
    pub host: Option<String>,
    /// Verify the daemon's TLS certificate
    pub tls_verify: bool,
    /// Directory holding `ca.pem`, `cert.pem` and `key.pem`
    pub cert_path: Option<PathBuf>,
}

impl EngineConnection {
    /// Check that the daemon address is usable.
    ///
    /// # Errors
    ///
    /// Returns error if the host is not a URL or uses an unsupported scheme.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let Some(ref host) = self.host else {
            return Ok(());
        };

        let url = Url::parse(host).map_err(|e| EnvironmentError::InvalidHost {
            host: host.clone(),
            reason: e.to_string(),
        })?;

        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(EnvironmentError::UnsupportedScheme {
                host: host.clone(),
                scheme: url.scheme().to_string(),
            });
        }

        Ok(())
    }

    /// Render the connection as engine CLI environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails [`validate`](Self::validate).
    pub fn engine_env(&self) -> Result<Vec<(String, String)>, EnvironmentError> {
        self.validate()?;

        let mut vars = Vec::new();
        if let Some(ref host) = self.host {
            vars.push(("DOCKER_HOST".to_string(), host.clone()));
        }
        if self.tls_verify {
            vars.push(("DOCKER_TLS_VERIFY".to_string(), "1".to_string()));
        }
        if let Some(ref cert_path) = self.cert_path {
            vars.push((
                "DOCKER_CERT_PATH".to_string(),
                cert_path.display().to_string(),
            ));
        }
        Ok(vars)
    }
}

/// One deployment target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEnvironment {
    /// Environment name, also used to pick playbook inventories
    #[serde(default)]
    pub name: String,
    /// Logical host key to actual hostname
    #[serde(default)]
    pub url_map: HashMap<String, String>,
    /// Engine daemon connection
    #[serde(default)]
    pub connection: EngineConnection,
}

impl TargetEnvironment {
    /// Create an environment talking to the local engine.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a URL alias.
    pub fn with_alias(mut self, alias: impl Into<String>, host: impl Into<String>) -> Self {
        self.url_map.insert(alias.into(), host.into());
        self
    }

    /// Set the engine connection.
    pub fn with_connection(mut self, connection: EngineConnection) -> Self {
        self.connection = connection;
        self
    }

    /// Substitute `host` through the alias table, leaving unknown hosts as-is.
    pub fn resolve_host<'a>(&'a self, host: &'a str) -> &'a str {
        self.url_map.get(host).map(String::as_str).unwrap_or(host)
    }
}
