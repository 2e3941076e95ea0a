//! Definition document store.
//!
//! Definitions live as one JSON document per container name in a single
//! directory (`<dir>/<name>.json`). Each document is either one definition
//! object or an array of them.

use crate::container::definition::{self, ContainerDefinition};
use crate::container::{ContainerError, Result};
use crate::env;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Loads container definitions from a directory of JSON documents.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    root: PathBuf,
}

impl DefinitionStore {
    /// Create a store over `root`. The directory is not touched until used.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `name` to the full set of definitions to act on: the
    /// document's definitions followed by their derived sidecars.
    ///
    /// The reserved reverse proxy name resolves to a single built-in
    /// definition without reading anything.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DefinitionNotFound`] if no document exists for
    /// `name` and [`ContainerError::DefinitionParse`] if it is malformed.
    pub async fn resolve(&self, name: &str) -> Result<Vec<ContainerDefinition>> {
        if name == env::proxy::NAME {
            return Ok(vec![ContainerDefinition::reverse_proxy()]);
        }

        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(ContainerError::InvalidDefinition(format!(
                "'{}' is not a valid definition name",
                name
            )));
        }

        let path = env::definition_file_path(&self.root, name);
        debug!("Reading container definition {} from {:?}", name, path);

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ContainerError::DefinitionNotFound {
                    name: name.to_string(),
                    path: path.clone(),
                },
                _ => ContainerError::IoError(e),
            })?;

        let definitions = Self::parse_document(name, &contents)?;
        Ok(definition::with_sidecars(definitions))
    }

    /// Parse one definition document, accepting a single object or a list.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DefinitionParse`] if the document is malformed.
    pub fn parse_document(name: &str, contents: &str) -> Result<Vec<ContainerDefinition>> {
        let parse_error = |source| ContainerError::DefinitionParse {
            name: name.to_string(),
            source,
        };

        let value: serde_json::Value = serde_json::from_str(contents).map_err(parse_error)?;

        if value.is_array() {
            serde_json::from_value(value).map_err(parse_error)
        } else {
            serde_json::from_value::<ContainerDefinition>(value)
                .map(|def| vec![def])
                .map_err(parse_error)
        }
    }

    /// List the names of all available definition documents, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DefinitionNotFound`] if the directory is missing.
    pub async fn list_available(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ContainerError::DefinitionNotFound {
                    name: String::new(),
                    path: self.root.clone(),
                },
                _ => ContainerError::IoError(e),
            })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(env::DEFINITION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        debug!("Found {} container definitions in {:?}", names.len(), self.root);
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_single_object_is_one_element_list() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("blog.json"),
            r#"{ "name": "blog", "image": "nginx" }"#,
        )
        .unwrap();

        let store = DefinitionStore::new(temp.path());
        let defs = store.resolve("blog").await.unwrap();

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "blog");
    }

    #[tokio::test]
    async fn test_list_document_with_sidecar() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("site.json"),
            r#"[
                { "name": "site", "image": "nginx",
                  "sftp": { "hostPort": 2222, "volumeType": "content" } },
                { "name": "site-db", "image": "mariadb" }
            ]"#,
        )
        .unwrap();

        let store = DefinitionStore::new(temp.path());
        let names: Vec<String> = store
            .resolve("site")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert_eq!(names, vec!["site", "site-db", "site-sftp"]);
    }

    #[tokio::test]
    async fn test_reverse_proxy_is_built_in() {
        let store = DefinitionStore::new("/nonexistent/definitions");
        let defs = store.resolve(env::proxy::NAME).await.unwrap();

        assert_eq!(defs, vec![ContainerDefinition::reverse_proxy()]);
    }

    #[tokio::test]
    async fn test_missing_document() {
        let temp = TempDir::new().unwrap();
        let store = DefinitionStore::new(temp.path());

        let result = store.resolve("ghost").await;
        assert!(matches!(result, Err(ContainerError::DefinitionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.json"), "{ not json").unwrap();
        fs::write(temp.path().join("wrong.json"), r#"{ "image": "nginx" }"#).unwrap();

        let store = DefinitionStore::new(temp.path());

        assert!(matches!(
            store.resolve("broken").await,
            Err(ContainerError::DefinitionParse { .. })
        ));
        assert!(matches!(
            store.resolve("wrong").await,
            Err(ContainerError::DefinitionParse { .. })
        ));
    }

    #[tokio::test]
    async fn test_path_like_names_are_rejected() {
        let store = DefinitionStore::new("/srv/containers");

        assert!(matches!(
            store.resolve("../etc/passwd").await,
            Err(ContainerError::InvalidDefinition(_))
        ));
    }

    #[tokio::test]
    async fn test_list_available_strips_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("web.json"), "{}").unwrap();
        fs::write(temp.path().join("db.json"), "{}").unwrap();
        fs::write(temp.path().join("README.md"), "notes").unwrap();
        fs::create_dir(temp.path().join("drafts.json")).unwrap();

        let store = DefinitionStore::new(temp.path());
        let names = store.list_available().await.unwrap();

        assert_eq!(names, vec!["db", "web"]);
    }

    #[tokio::test]
    async fn test_list_available_missing_directory() {
        let store = DefinitionStore::new("/nonexistent/definitions");

        let result = store.list_available().await;
        assert!(matches!(result, Err(ContainerError::DefinitionNotFound { .. })));
    }
}
