//! Command line argument parsing
//!
//! Subcommands:
//! - `list`: List available container definitions
//! - `show`: Print the resolved definitions for a name, sidecars included
//! - `create`: Create the containers a definition resolves to
//! - `delete`: Remove the containers a definition resolves to
//! - `inspect`: Print the observed state of one container
//! - `proxy`: Make sure the reverse proxy is running
//! - `playbook`: Run a host playbook against an environment
//! - `show-config`: Show configuration discovery information

use crate::playbook::PlaybookKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dockhand")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile declared container definitions against a Docker host")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Definitions directory override
    #[arg(short = 'd', long = "definitions", global = true)]
    pub definitions: Option<PathBuf>,

    /// Enable verbose output and echo engine commands
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available container definitions
    List,
    /// Print the resolved definitions for a name
    Show {
        /// Definition name
        name: String,
    },
    /// Create missing containers for a definition
    Create {
        /// Target environment
        environment: String,
        /// Definition name
        name: String,
    },
    /// Delete the containers of a definition
    Delete {
        /// Target environment
        environment: String,
        /// Definition name
        name: String,
    },
    /// Print the observed state of a container
    Inspect {
        /// Target environment
        environment: String,
        /// Container name or identifier
        name: String,
    },
    /// Ensure the reverse proxy is running
    Proxy {
        /// Target environment
        environment: String,
    },
    /// Run a host playbook
    Playbook {
        /// Target environment
        environment: String,
        /// Playbook to run
        #[arg(value_enum)]
        kind: PlaybookKind,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
