use std::{fs, path::PathBuf};

use clap::{Args, Subcommand};
use omni_account::{EndpointRegistry, StaticEndpointRegistry};

use crate::common::Result;

/// Endpoint registry commands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the endpoints of one chain
    Resolve(ResolveCmd),
    /// List the chains of a registry
    Chains(ConfigArgs),
}

/// Location of the registry document.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// JSON registry mapping chain ids to `rpcUrl`, `bundlerUrl` and `paymasterUrl`
    #[arg(long = "config", env = "OMNI_ENDPOINTS")]
    pub config: PathBuf,
}

impl ConfigArgs {
    /// Reads and validates the registry.
    pub fn load(&self) -> Result<StaticEndpointRegistry> {
        Ok(StaticEndpointRegistry::from_json(&fs::read_to_string(&self.config)?)?)
    }
}

/// Resolve the endpoints of a chain
#[derive(Args, Debug)]
pub struct ResolveCmd {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Chain to resolve
    #[arg(long = "chain-id")]
    pub chain_id: u64,
}

impl Cmd {
    /// Runs the command and returns its output.
    pub fn execute(&self) -> Result<String> {
        match self {
            Self::Resolve(cmd) => {
                let endpoints = cmd.config.load()?.resolve(cmd.chain_id)?;
                Ok(serde_json::to_string_pretty(&endpoints)?)
            }
            Self::Chains(config) => Ok(config
                .load()?
                .chain_ids()
                .map(|chain_id| chain_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}
