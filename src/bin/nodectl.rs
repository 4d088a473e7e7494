//! Node registry CLI
//!
//! Inspect and edit the wallet's node registry from a terminal. Works on the
//! same storage the wallet uses, so changes show up in the node picker on the
//! next start.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use wallet_node_registry::logging;
use wallet_node_registry::node::commands::{self, CommandResult};
use wallet_node_registry::{create_node_registry, NodeCandidate, RegistryConfig};

/// Manage the wallet's RPC nodes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Registry config file (defaults to the platform config dir)
    #[arg(long, env = "NODES_CONFIG")]
    config: Option<PathBuf>,

    /// Override the storage directory
    #[arg(long, env = "NODES_STORAGE_DIR")]
    storage_dir: Option<String>,

    /// Override the storage namespace
    #[arg(long, env = "NODES_NAMESPACE")]
    namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all nodes and the current selection
    List,
    /// Show the active node
    Current,
    /// Add a user node
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Full node URL
        #[arg(long)]
        full: String,
        /// Solidity node URL (defaults to the full node URL)
        #[arg(long)]
        solidity: Option<String>,
        /// Event server URL (defaults to the full node URL)
        #[arg(long)]
        event: Option<String>,
        /// Node targets the production network
        #[arg(long)]
        mainnet: bool,
    },
    /// Remove a user node
    Remove {
        /// Node key
        key: String,
    },
    /// Select the active node
    Select {
        /// Node key
        key: String,
    },
    /// Remove all user nodes and select the default node
    Reset,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RegistryConfig::load_from(path),
        None => RegistryConfig::load(),
    };
    if let Some(dir) = args.storage_dir {
        config.storage_dir = Some(dir);
    }
    if let Some(namespace) = args.namespace {
        config.namespace = namespace;
    }

    if let Err(e) = logging::init_logger(&config.log_directory(), logging::parse_level(&args.log_level)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let state = create_node_registry(&config);

    match args.command {
        Command::List => print_result(commands::get_nodes(&state)),
        Command::Current => print_result(commands::get_current_node(&state)),
        Command::Add {
            name,
            full,
            solidity,
            event,
            mainnet,
        } => {
            let candidate = NodeCandidate {
                name,
                solidity: solidity.unwrap_or_else(|| full.clone()),
                event: event.unwrap_or_else(|| full.clone()),
                full,
                mainnet,
            };
            print_result(commands::add_node(candidate, &state))
        }
        Command::Remove { key } => {
            let result = commands::remove_node(key.clone(), &state);
            if result.data == Some(false) {
                bail!("{} is not a user node", key);
            }
            print_result(result)
        }
        Command::Select { key } => {
            let result = commands::select_node(key.clone(), &state);
            if result.data == Some(false) {
                bail!("Unknown node {}", key);
            }
            print_result(result)
        }
        Command::Reset => print_result(commands::reset_nodes(&state)),
    }
}

fn print_result<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(&result).context("Failed to serialize output")?;
    println!("{}", output);

    if let Some(error) = result.error {
        bail!(error);
    }
    Ok(())
}
