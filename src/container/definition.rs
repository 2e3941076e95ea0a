//! Declarative container definitions.
//!
//! A definition document holds either one [`ContainerDefinition`] or a list
//! of them. Definitions carrying an `sftp` block get an SFTP sidecar derived
//! next to them that exposes the parent's content volume over SSH.

use crate::env;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One volume mount, by logical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBinding {
    /// Logical volume type, resolved to a concrete volume at create time
    #[serde(rename = "type")]
    pub volume_type: String,
    /// Path inside the container
    pub mount_point: String,
}

impl VolumeBinding {
    pub fn new(volume_type: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            volume_type: volume_type.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// One published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    pub container_port: u16,
    pub host_port: u16,
}

/// Request for an SFTP sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SftpConfig {
    /// Host port forwarded to the sidecar's SSH port
    pub host_port: u16,
    /// Logical volume type shared with the parent container
    pub volume_type: String,
}

/// Desired state of one deployable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    /// Container name, unique within one resolution
    pub name: String,

    /// Image reference; unset only for built-in definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Host the reverse proxy should route to this container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_route: Option<String>,

    /// Path prefix stripped by the reverse proxy before forwarding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_route: Option<String>,

    #[serde(default)]
    pub volumes: Vec<VolumeBinding>,

    #[serde(default)]
    pub ports: Vec<PortBinding>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sftp: Option<SftpConfig>,
}

impl ContainerDefinition {
    /// Create a definition with a name and image and nothing else.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: Some(image.into()),
            ..Default::default()
        }
    }

    /// The built-in reverse proxy definition. It has no image because the
    /// proxy is only ever created through the bootstrap path.
    pub fn reverse_proxy() -> Self {
        Self {
            name: env::proxy::NAME.to_string(),
            ..Default::default()
        }
    }

    /// Whether this is the reserved reverse proxy definition.
    pub fn is_reverse_proxy(&self) -> bool {
        self.name == env::proxy::NAME
    }

    /// Build the reverse proxy routing rule for this definition, if it
    /// declares a host route. `resolve_host` maps the raw host through the
    /// environment's alias table. Empty routes count as unset.
    pub fn routing_rule<'a, F>(&'a self, resolve_host: F) -> Option<String>
    where
        F: FnOnce(&'a str) -> &'a str,
    {
        let host = self.host_route.as_deref().filter(|h| !h.is_empty())?;
        let mut rule = format!("Host: {}", resolve_host(host));
        if let Some(path) = self.path_route.as_deref().filter(|p| !p.is_empty()) {
            rule.push_str(&format!("; PathPrefixStrip: {}", path));
        }
        Some(rule)
    }

    /// Derive the SFTP sidecar for this definition.
    ///
    /// Returns `None` unless an `sftp` block is present.
    pub fn sftp_sidecar(&self) -> Option<ContainerDefinition> {
        let sftp = self.sftp.as_ref()?;

        Some(ContainerDefinition {
            name: format!("{}{}", self.name, env::sftp::NAME_SUFFIX),
            image: Some(env::sftp::IMAGE.to_string()),
            host_route: None,
            path_route: None,
            volumes: vec![
                VolumeBinding::new(env::sftp::SSH_KEY_VOLUME, env::sftp::SSH_KEY_MOUNT),
                VolumeBinding::new(env::sftp::SSH_USER_VOLUME, env::sftp::SSH_USER_MOUNT),
                VolumeBinding::new(sftp.volume_type.clone(), env::sftp::SHARED_ROOT_MOUNT),
            ],
            ports: vec![PortBinding {
                container_port: env::sftp::CONTAINER_PORT,
                host_port: sftp.host_port,
            }],
            env: env::sftp::ROOT_IDENTITY_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            sftp: None,
        })
    }
}

/// Append the derived sidecars after the primary definitions, preserving
/// the order of the primaries that produced them.
pub fn with_sidecars(definitions: Vec<ContainerDefinition>) -> Vec<ContainerDefinition> {
    let sidecars: Vec<ContainerDefinition> = definitions
        .iter()
        .filter_map(ContainerDefinition::sftp_sidecar)
        .collect();

    let mut resolved = definitions;
    resolved.extend(sidecars);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_with_sftp() -> ContainerDefinition {
        ContainerDefinition {
            sftp: Some(SftpConfig {
                host_port: 2222,
                volume_type: "content".to_string(),
            }),
            ..ContainerDefinition::new("web", "nginx")
        }
    }

    #[test]
    fn test_sidecar_derived_from_sftp_block() {
        let sidecar = web_with_sftp().sftp_sidecar().unwrap();

        assert_eq!(sidecar.name, "web-sftp");
        assert_eq!(sidecar.image.as_deref(), Some(env::sftp::IMAGE));
        assert_eq!(sidecar.volumes.len(), 3);
        assert_eq!(sidecar.volumes[2], VolumeBinding::new("content", "/volumes/sftp_root/www"));
        assert_eq!(
            sidecar.ports,
            vec![PortBinding {
                container_port: 22,
                host_port: 2222
            }]
        );
        assert_eq!(sidecar.env.len(), 4);
        assert_eq!(sidecar.env["SFTP_CONTAINER_USER_ID"], "0");
        assert!(sidecar.sftp.is_none());
    }

    #[test]
    fn test_no_sidecar_without_sftp_block() {
        assert!(ContainerDefinition::new("web", "nginx").sftp_sidecar().is_none());
    }

    #[test]
    fn test_with_sidecars_keeps_primaries_first() {
        let defs = vec![
            web_with_sftp(),
            ContainerDefinition::new("db", "postgres"),
            ContainerDefinition {
                sftp: Some(SftpConfig {
                    host_port: 2223,
                    volume_type: "uploads".to_string(),
                }),
                ..ContainerDefinition::new("api", "node")
            },
        ];

        let names: Vec<String> = with_sidecars(defs).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["web", "db", "api", "web-sftp", "api-sftp"]);
    }

    #[test]
    fn test_routing_rule() {
        let mut def = ContainerDefinition::new("blog", "nginx");
        assert!(def.routing_rule(|h| h).is_none());

        def.host_route = Some("blog.example.com".to_string());
        assert_eq!(
            def.routing_rule(|_| "blog.internal").as_deref(),
            Some("Host: blog.internal")
        );

        def.path_route = Some("/blog".to_string());
        assert_eq!(
            def.routing_rule(|h| h).as_deref(),
            Some("Host: blog.example.com; PathPrefixStrip: /blog")
        );
    }

    #[test]
    fn test_empty_routes_are_unset() {
        let mut def = ContainerDefinition::new("blog", "nginx");
        def.host_route = Some("blog.example.com".to_string());
        def.path_route = Some(String::new());
        assert_eq!(def.routing_rule(|h| h).as_deref(), Some("Host: blog.example.com"));

        def.host_route = Some(String::new());
        def.path_route = Some("/blog".to_string());
        assert!(def.routing_rule(|h| h).is_none());
    }

    #[test]
    fn test_deserialize_camel_case_document() {
        let def: ContainerDefinition = serde_json::from_str(
            r#"{
                "name": "blog",
                "image": "nginx",
                "hostRoute": "blog.example.com",
                "pathRoute": "/",
                "volumes": [{ "type": "content", "mountPoint": "/var/www" }],
                "ports": [{ "containerPort": 80, "hostPort": 8081 }],
                "env": { "mode": "production" },
                "sftp": { "hostPort": 2222, "volumeType": "content" }
            }"#,
        )
        .unwrap();

        assert_eq!(def.host_route.as_deref(), Some("blog.example.com"));
        assert_eq!(def.volumes[0].volume_type, "content");
        assert_eq!(def.ports[0].host_port, 8081);
        assert_eq!(def.env["mode"], "production");
        assert_eq!(def.sftp.unwrap().volume_type, "content");
    }

    #[test]
    fn test_reverse_proxy_definition_has_no_image() {
        let proxy = ContainerDefinition::reverse_proxy();
        assert!(proxy.is_reverse_proxy());
        assert!(proxy.image.is_none());
    }
}
