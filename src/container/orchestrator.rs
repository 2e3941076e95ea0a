//! Container reconciliation.
//!
//! Drives the engine CLI to bring a target host in line with a set of
//! container definitions. Every step is awaited before the next one starts:
//! definitions, volumes and ports are processed strictly in declared order.
//! A container is considered in place as soon as one with the definition's
//! name exists; nothing else about it is compared.

use crate::container::definition::ContainerDefinition;
use crate::container::runner::{CommandRunner, EngineConfig};
use crate::container::state::ContainerState;
use crate::container::store::DefinitionStore;
use crate::container::volume::VolumeManager;
use crate::container::{ContainerError, Result};
use crate::env::proxy;
use crate::environment::TargetEnvironment;
use crate::executor::CommandExecutor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of inspecting a container by name or identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectOutcome {
    /// The engine reported the container
    Found(Box<ContainerState>),
    /// No such container, or the engine could not be asked
    Absent,
}

impl InspectOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, InspectOutcome::Found(_))
    }

    pub fn into_state(self) -> Option<ContainerState> {
        match self {
            InspectOutcome::Found(state) => Some(*state),
            InspectOutcome::Absent => None,
        }
    }
}

/// What to delete.
#[derive(Debug, Clone)]
pub enum DeleteTarget {
    /// Definition name, resolved through the store (sidecars included)
    Name(String),
    /// A single definition
    Definition(ContainerDefinition),
    /// Several definitions, deleted in order
    Definitions(Vec<ContainerDefinition>),
}

impl From<&str> for DeleteTarget {
    fn from(name: &str) -> Self {
        DeleteTarget::Name(name.to_string())
    }
}

impl From<String> for DeleteTarget {
    fn from(name: String) -> Self {
        DeleteTarget::Name(name)
    }
}

impl From<ContainerDefinition> for DeleteTarget {
    fn from(definition: ContainerDefinition) -> Self {
        DeleteTarget::Definition(definition)
    }
}

impl From<Vec<ContainerDefinition>> for DeleteTarget {
    fn from(definitions: Vec<ContainerDefinition>) -> Self {
        DeleteTarget::Definitions(definitions)
    }
}

/// Creates and deletes containers from definitions, idempotently.
pub struct ContainerOrchestrator {
    store: DefinitionStore,
    executor: Arc<dyn CommandExecutor>,
    engine: EngineConfig,
    volumes: VolumeManager,
}

impl ContainerOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        store: DefinitionStore,
        executor: Arc<dyn CommandExecutor>,
        engine: EngineConfig,
    ) -> Self {
        let volumes = VolumeManager::new(executor.clone(), engine.clone());
        Self {
            store,
            executor,
            engine,
            volumes,
        }
    }

    /// Get the definition store.
    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    /// Get the volume manager.
    pub fn volumes(&self) -> &VolumeManager {
        &self.volumes
    }

    fn runner<'a>(&'a self, environment: &'a TargetEnvironment) -> CommandRunner<'a> {
        CommandRunner::new(self.executor.as_ref(), &self.engine, environment)
    }

    /// Inspect a container by name or identifier.
    ///
    /// Never fails: any engine failure, including "no such container", and
    /// an empty result are reported as [`InspectOutcome::Absent`].
    pub async fn inspect(&self, environment: &TargetEnvironment, name: &str) -> InspectOutcome {
        let output = self
            .runner(environment)
            .args(["container", "inspect", name])
            .execute()
            .await;

        match output {
            Ok(output) => match ContainerState::from_inspect_output(&output) {
                Some(state) => InspectOutcome::Found(Box::new(state)),
                None => {
                    debug!("Inspect of {} returned no container", name);
                    InspectOutcome::Absent
                }
            },
            Err(e) => {
                debug!("Treating {} as absent: {}", name, e);
                InspectOutcome::Absent
            }
        }
    }

    /// Check whether a container with `name` exists.
    pub async fn exists(&self, environment: &TargetEnvironment, name: &str) -> bool {
        self.inspect(environment, name).await.is_found()
    }

    /// Make sure the reverse proxy is running, starting it if absent.
    ///
    /// Returns the existing proxy's state untouched if it is already there.
    ///
    /// # Errors
    ///
    /// Returns error if the `run` invocation fails or the new container
    /// cannot be inspected afterwards.
    pub async fn ensure_reverse_proxy(
        &self,
        environment: &TargetEnvironment,
    ) -> Result<ContainerState> {
        if let InspectOutcome::Found(state) = self.inspect(environment, proxy::NAME).await {
            debug!("Reverse proxy already present on {}", environment.name);
            return Ok(*state);
        }

        info!("Starting reverse proxy on {}", environment.name);

        let id = self
            .runner(environment)
            .args(["run", "-d", "--restart", "always"])
            .args(["--publish", "8080:8080", "--publish", "80:80"])
            .arg("--volume")
            .arg(format!("{0}:{0}", proxy::ENGINE_SOCKET))
            .args(["--name", proxy::NAME, proxy::IMAGE, "--api", "--docker"])
            .execute()
            .await?;

        self.inspect_created(environment, &id, proxy::NAME).await
    }

    /// Create every container `name` resolves to that does not exist yet.
    ///
    /// Definitions are processed one at a time in resolved order (primaries,
    /// then sidecars). The returned states are in the same order; existing
    /// containers contribute their current state.
    ///
    /// # Errors
    ///
    /// Definition errors abort before any engine command runs. An engine
    /// failure while creating aborts the remaining definitions; containers
    /// created earlier in the call are left in place.
    pub async fn create(
        &self,
        environment: &TargetEnvironment,
        name: &str,
    ) -> Result<Vec<ContainerState>> {
        let definitions = self.store.resolve(name).await?;
        for definition in &definitions {
            validate(definition)?;
        }

        info!(
            "Reconciling {} definition(s) for {} on {}",
            definitions.len(),
            name,
            environment.name
        );

        let mut states = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            let state = self.create_one(environment, definition).await?;
            states.push(state);
        }

        Ok(states)
    }

    async fn create_one(
        &self,
        environment: &TargetEnvironment,
        definition: &ContainerDefinition,
    ) -> Result<ContainerState> {
        if definition.is_reverse_proxy() {
            return self.ensure_reverse_proxy(environment).await;
        }

        if let InspectOutcome::Found(state) = self.inspect(environment, &definition.name).await {
            info!("Container {} already exists, skipping", definition.name);
            return Ok(*state);
        }

        let id = self.run_command(environment, definition).await?.execute().await?;
        info!("Created container {} ({})", definition.name, id);

        self.inspect_created(environment, &id, &definition.name).await
    }

    /// Assemble the `run` invocation for `definition`, creating any volumes
    /// it references along the way.
    ///
    /// Argument order: base flags, routing label, volumes, published ports,
    /// environment variables (keys upper-cased), image.
    ///
    /// # Errors
    ///
    /// Returns error if the definition has no image or a volume cannot be
    /// resolved.
    pub async fn run_command<'a>(
        &'a self,
        environment: &'a TargetEnvironment,
        definition: &ContainerDefinition,
    ) -> Result<CommandRunner<'a>> {
        let image = definition.image.as_deref().ok_or_else(|| {
            ContainerError::InvalidDefinition(format!("{} has no image", definition.name))
        })?;

        let mut runner = self.runner(environment);
        runner
            .args(["run", "-d", "--restart", "always", "--name"])
            .arg(definition.name.as_str());

        if let Some(rule) = definition.routing_rule(|host| environment.resolve_host(host)) {
            runner
                .arg("--label")
                .arg(format!("{}={}", proxy::RULE_LABEL, rule));
        }

        for binding in &definition.volumes {
            let volume = self
                .volumes
                .get_or_create(environment, &binding.volume_type)
                .await?;
            runner
                .arg("--volume")
                .arg(format!("{}:{}", volume.name, binding.mount_point));
        }

        for port in &definition.ports {
            runner
                .arg("--publish")
                .arg(format!("{}:{}", port.host_port, port.container_port));
        }

        for (key, value) in &definition.env {
            runner
                .arg("--env")
                .arg(format!("{}={}", key.to_uppercase(), value));
        }

        runner.arg(image);
        Ok(runner)
    }

    /// Delete every container `target` resolves to that exists.
    ///
    /// Returns the names of the containers that were removed; absent
    /// containers are skipped silently. An empty name deletes nothing.
    ///
    /// # Errors
    ///
    /// Definition errors abort before any engine command runs. A failing
    /// removal aborts the remaining definitions without restoring anything.
    pub async fn delete(
        &self,
        environment: &TargetEnvironment,
        target: impl Into<DeleteTarget>,
    ) -> Result<Vec<String>> {
        let definitions = match target.into() {
            DeleteTarget::Name(name) if name.is_empty() => {
                debug!("No definition name given, nothing to delete");
                return Ok(Vec::new());
            }
            DeleteTarget::Name(name) => self.store.resolve(&name).await?,
            DeleteTarget::Definition(definition) => vec![definition],
            DeleteTarget::Definitions(definitions) => definitions,
        };

        let mut removed = Vec::new();
        for definition in &definitions {
            let InspectOutcome::Found(state) = self.inspect(environment, &definition.name).await
            else {
                debug!("Container {} does not exist, nothing to delete", definition.name);
                continue;
            };

            self.runner(environment)
                .args(["rm", "--force", state.id.as_str()])
                .execute()
                .await?;

            info!("Removed container {} ({})", definition.name, state.id);
            removed.push(definition.name.clone());
        }

        Ok(removed)
    }

    /// Inspect a container that `run` just reported creating.
    ///
    /// The engine prints the new container's identifier, which inspect
    /// accepts in place of the name. The name is only used if the identifier
    /// is empty or does not resolve.
    async fn inspect_created(
        &self,
        environment: &TargetEnvironment,
        id: &str,
        name: &str,
    ) -> Result<ContainerState> {
        if !id.is_empty() {
            if let InspectOutcome::Found(state) = self.inspect(environment, id).await {
                return Ok(*state);
            }
            warn!("Container id {} did not resolve, inspecting {} by name", id, name);
        }

        self.inspect(environment, name)
            .await
            .into_state()
            .ok_or_else(|| ContainerError::NotCreated(name.to_string()))
    }
}

fn validate(definition: &ContainerDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(ContainerError::InvalidDefinition(
            "definition name must not be empty".to_string(),
        ));
    }
    if !definition.is_reverse_proxy() && definition.image.is_none() {
        return Err(ContainerError::InvalidDefinition(format!(
            "{} has no image",
            definition.name
        )));
    }
    Ok(())
}
