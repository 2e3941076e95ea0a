use async_trait::async_trait;
use dockhand::cli::{ConfigError, DockhandConfig};
use dockhand::container::{ContainerOrchestrator, DefinitionStore, InspectOutcome};
use dockhand::executor::{
    CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError,
};
use dockhand::playbook::{PlaybookKind, PlaybookRunner};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

const SAMPLE_CONFIG: &str = r#"
definitions_dir = "containers"

[engine]
binary = "podman"
echo_commands = true

[ansible]
directory = "provisioning"

[environments.prod]
url_map = { "blog.example.com" = "blog.prod.internal" }

[environments.prod.connection]
host = "tcp://10.0.0.5:2376"
tls_verify = true
cert_path = "/etc/dockhand/certs/prod"

[environments.dev]
name = "development"
"#;

/// Records program, arguments and environment of every invocation.
#[derive(Default)]
struct CapturingExecutor {
    calls: Mutex<Vec<(String, Vec<String>, HashMap<String, String>)>>,
}

#[async_trait]
impl CommandExecutor for CapturingExecutor {
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError> {
        self.calls
            .lock()
            .unwrap()
            .push((cmd.program, cmd.args, cmd.env));
        Ok(ExecutionResult {
            stdout: String::new(),
            stderr: "Error: No such container".to_string(),
            exit_code: 1,
            duration: Duration::ZERO,
        })
    }

    fn executor_type(&self) -> &'static str {
        "capturing"
    }
}

#[test]
fn test_config_parsing() {
    let config = DockhandConfig::from_toml_str(SAMPLE_CONFIG).expect("config should parse");

    assert_eq!(config.definitions_dir, PathBuf::from("containers"));
    assert_eq!(config.engine.binary, "podman");
    assert!(config.engine.echo_commands);
    assert_eq!(config.ansible.directory, PathBuf::from("provisioning"));

    let prod = config.environment("prod").unwrap();
    assert_eq!(prod.name, "prod");
    assert_eq!(prod.resolve_host("blog.example.com"), "blog.prod.internal");
    assert_eq!(prod.resolve_host("other.example.com"), "other.example.com");
    assert!(prod.connection.tls_verify);

    // An explicit name wins over the table key.
    assert_eq!(config.environment("dev").unwrap().name, "development");

    assert!(matches!(
        config.environment("staging"),
        Err(ConfigError::UnknownEnvironment(name)) if name == "staging"
    ));
}

#[test]
fn test_config_defaults() {
    let config = DockhandConfig::from_toml_str("").unwrap();

    assert_eq!(config, DockhandConfig::default());
    assert_eq!(config.engine.binary, "docker");
    assert!(!config.engine.echo_commands);
    assert!(config.environments.is_empty());
}

#[test]
fn test_config_rejects_bad_engine_host() {
    let result = DockhandConfig::from_toml_str(
        r#"
[environments.prod.connection]
host = "http://10.0.0.5:2376"
"#,
    );

    assert!(matches!(
        result,
        Err(ConfigError::Environment { ref name, .. }) if name == "prod"
    ));
    assert!(matches!(
        DockhandConfig::from_toml_str("engine = 3"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_config_file_operations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dockhand.toml");
    fs::write(&path, SAMPLE_CONFIG).unwrap();

    let loaded = DockhandConfig::from_toml_file(&path).unwrap();

    // Relative paths resolve against the file's directory.
    assert_eq!(loaded.definitions_dir, temp_dir.path().join("containers"));
    assert_eq!(loaded.ansible.directory, temp_dir.path().join("provisioning"));

    let saved = NamedTempFile::new().unwrap();
    loaded.to_toml_file(saved.path()).unwrap();
    let reloaded = DockhandConfig::from_toml_file(saved.path()).unwrap();
    assert_eq!(reloaded, loaded);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = DockhandConfig::from_toml_file(temp_dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[tokio::test]
async fn test_environment_connection_reaches_engine_invocations() {
    let config = DockhandConfig::from_toml_str(SAMPLE_CONFIG).unwrap();
    let executor = Arc::new(CapturingExecutor::default());
    let orchestrator = ContainerOrchestrator::new(
        DefinitionStore::new(&config.definitions_dir),
        executor.clone(),
        config.engine.clone(),
    );

    let outcome = orchestrator
        .inspect(config.environment("prod").unwrap(), "blog")
        .await;
    assert_eq!(outcome, InspectOutcome::Absent);

    let calls = executor.calls.lock().unwrap();
    let (program, args, env) = &calls[0];
    assert_eq!(program, "podman");
    assert_eq!(args, &["container", "inspect", "blog"]);
    assert_eq!(env.get("DOCKER_HOST").unwrap(), "tcp://10.0.0.5:2376");
    assert_eq!(env.get("DOCKER_TLS_VERIFY").unwrap(), "1");
    assert_eq!(
        env.get("DOCKER_CERT_PATH").unwrap(),
        "/etc/dockhand/certs/prod"
    );
}

#[tokio::test]
async fn test_playbook_uses_configured_directory() {
    let config = DockhandConfig::from_toml_str(SAMPLE_CONFIG).unwrap();
    let executor = Arc::new(CapturingExecutor::default());
    let runner = PlaybookRunner::new(executor.clone(), config.ansible.clone());

    // The capturing executor reports failure for everything.
    assert!(runner.run("prod", PlaybookKind::UploadFiles).await.is_err());

    let calls = executor.calls.lock().unwrap();
    let (program, args, env) = &calls[0];
    assert_eq!(program, "/usr/bin/ansible-playbook");
    assert_eq!(
        args,
        &[
            "-i",
            "provisioning/prod-inventory.sh",
            "provisioning/upload-files.yaml"
        ]
    );
    assert_eq!(env.get("ANSIBLE_HOST_KEY_CHECKING").unwrap(), "False");
}
