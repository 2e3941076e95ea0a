use anyhow::Context;
use dockhand::cli::{Args, Commands, ConfigDiscovery, DockhandConfig};
use dockhand::container::{ContainerOrchestrator, DefinitionStore, InspectOutcome};
use dockhand::executor::{CommandExecutor, HostExecutor};
use dockhand::playbook::PlaybookRunner;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "dockhand=debug"
    } else {
        "dockhand=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::ShowConfig = args.command {
        ConfigDiscovery::show_discovery_info();
        return Ok(());
    }

    let mut config = match args.config {
        Some(ref path) => DockhandConfig::from_toml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigDiscovery::discover_config().context("discovering configuration")?,
    };
    if let Some(ref definitions) = args.definitions {
        config.definitions_dir = definitions.clone();
    }
    if args.verbose {
        config.engine.echo_commands = true;
    }

    let executor: Arc<dyn CommandExecutor> = Arc::new(HostExecutor::new());

    match HostExecutor::locate(&config.engine.binary) {
        Ok(path) => debug!("Using engine binary {}", path.display()),
        Err(e) => warn!("{}; engine commands will fail", e),
    }

    let orchestrator = ContainerOrchestrator::new(
        DefinitionStore::new(config.definitions_dir.clone()),
        executor.clone(),
        config.engine.clone(),
    );

    match args.command {
        Commands::List => {
            for name in orchestrator.store().list_available().await? {
                println!("{}", name);
            }
        }
        Commands::Show { name } => {
            let definitions = orchestrator.store().resolve(&name).await?;
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
        Commands::Create { environment, name } => {
            let environment = config.environment(&environment)?;
            let states = orchestrator
                .create(environment, &name)
                .await
                .with_context(|| format!("creating {} on {}", name, environment.name))?;
            println!("{}", serde_json::to_string_pretty(&states)?);
        }
        Commands::Delete { environment, name } => {
            let environment = config.environment(&environment)?;
            let removed = orchestrator
                .delete(environment, name.as_str())
                .await
                .with_context(|| format!("deleting {} on {}", name, environment.name))?;
            info!("Removed {} container(s)", removed.len());
            for name in removed {
                println!("{}", name);
            }
        }
        Commands::Inspect { environment, name } => {
            let environment = config.environment(&environment)?;
            match orchestrator.inspect(environment, &name).await {
                InspectOutcome::Found(state) => {
                    println!("{}", serde_json::to_string_pretty(&state)?)
                }
                InspectOutcome::Absent => {
                    eprintln!("No such container: {}", name);
                    std::process::exit(1);
                }
            }
        }
        Commands::Proxy { environment } => {
            let environment = config.environment(&environment)?;
            let state = orchestrator
                .ensure_reverse_proxy(environment)
                .await
                .context("starting reverse proxy")?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Playbook { environment, kind } => {
            let environment = config.environment(&environment)?;
            let runner = PlaybookRunner::new(executor, config.ansible.clone());
            let output = runner
                .run(&environment.name, kind)
                .await
                .with_context(|| format!("running {} on {}", kind, environment.name))?;
            if args.verbose {
                println!("{}", output);
            }
        }
        Commands::ShowConfig => ConfigDiscovery::show_discovery_info(),
    }

    Ok(())
}
