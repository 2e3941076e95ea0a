//! Environment constants and path utilities for dockhand.
//!
//! This module centralizes the hardcoded names used throughout the
//! application: configuration locations, reserved container names, and the
//! fixed parameters of derived containers.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const DOCKHAND_DIR_NAME: &str = ".dockhand";

/// Configuration file name inside [`DOCKHAND_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "dockhand.toml";

/// Default directory holding one JSON document per container name
pub const DEFAULT_DEFINITIONS_DIR: &str = "containers";

/// Extension of definition documents
pub const DEFINITION_EXTENSION: &str = "json";

/// Default engine CLI binary
pub const DEFAULT_ENGINE_BINARY: &str = "docker";

/// Label put on every volume the volume manager creates
pub const VOLUME_TYPE_LABEL: &str = "dockhand.volume-type";

/// Reverse proxy container constants
pub mod proxy {
    /// Reserved container name of the reverse proxy
    pub const NAME: &str = "traefik_proxy";

    /// Image the proxy is bootstrapped from
    pub const IMAGE: &str = "traefik";

    /// Label key carrying a container's routing rule
    pub const RULE_LABEL: &str = "traefik.frontend.rule";

    /// Engine control socket bind-mounted into the proxy
    pub const ENGINE_SOCKET: &str = "/var/run/docker.sock";
}

/// SFTP sidecar constants
pub mod sftp {
    /// Suffix appended to the parent definition name
    pub const NAME_SUFFIX: &str = "-sftp";

    /// Sidecar image
    pub const IMAGE: &str = "willia4/sftp_volume:1.4.0";

    /// Port the sidecar's SSH daemon listens on
    pub const CONTAINER_PORT: u16 = 22;

    /// Logical volume type holding SSH host keys
    pub const SSH_KEY_VOLUME: &str = "ssh_key";

    /// Logical volume type holding the SFTP user database
    pub const SSH_USER_VOLUME: &str = "ssh_user";

    pub const SSH_KEY_MOUNT: &str = "/volumes/ssh_keys";
    pub const SSH_USER_MOUNT: &str = "/volumes/user";
    pub const SHARED_ROOT_MOUNT: &str = "/volumes/sftp_root/www";

    /// Identity the sidecar runs its SFTP server as
    pub const ROOT_IDENTITY_ENV: [(&str, &str); 4] = [
        ("SFTP_CONTAINER_GROUP", "root"),
        ("SFTP_CONTAINER_GROUP_ID", "0"),
        ("SFTP_CONTAINER_USER", "root"),
        ("SFTP_CONTAINER_USER_ID", "0"),
    ];
}

/// Playbook runner constants
pub mod ansible {
    /// Default playbook runner binary
    pub const DEFAULT_PLAYBOOK_BINARY: &str = "/usr/bin/ansible-playbook";

    /// Default directory holding inventories and playbooks
    pub const DEFAULT_DIRECTORY: &str = "ansible";

    /// Variable disabling host-key verification for one invocation
    pub const HOST_KEY_CHECKING_VAR: &str = "ANSIBLE_HOST_KEY_CHECKING";
}

/// Build the main .dockhand directory path from a base directory
pub fn dockhand_dir_path(base: &Path) -> PathBuf {
    base.join(DOCKHAND_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    dockhand_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    dockhand_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the path of the definition document for `name`
pub fn definition_file_path(definitions_dir: &Path, name: &str) -> PathBuf {
    definitions_dir.join(format!("{}.{}", name, DEFINITION_EXTENSION))
}
