use clap::{Parser, Subcommand};

use crate::common::{CliError, LogArgs, LoggingError};

/// Operator CLI for omni passkey accounts.
#[derive(Parser, Debug)]
#[command(name = "omni", infer_subcommands = true, version)]
pub struct Cli {
    /// Logging options, accepted by every subcommand.
    #[command(flatten)]
    pub log: LogArgs,

    /// The command to run.
    #[command(subcommand)]
    pub cmd: MainCmd,
}

/// Main command enumeration for the omni CLI tool
#[derive(Subcommand, Debug)]
pub enum MainCmd {
    /// Build, sign and decode EIP-7702 authorizations
    #[command(subcommand)]
    Auth(crate::auth::Cmd),
    /// Verify passkey ceremonies
    #[command(subcommand)]
    Passkey(crate::passkey::Cmd),
    /// Provision and inspect accounts
    #[command(subcommand)]
    Account(crate::account::Cmd),
    /// Resolve per-chain service endpoints
    #[command(subcommand)]
    Endpoints(crate::endpoints::Cmd),
    /// Encode accumulator calldata and decode its errors
    #[command(subcommand)]
    Job(crate::job::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Logging could not be set up
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// A subcommand failed
    #[error(transparent)]
    Cli(#[from] CliError),
}

impl Cli {
    /// Installs logging, then runs the selected command and prints its output to stdout.
    pub fn run(&self) -> Result<(), Error> {
        self.log.init()?;
        let output = self.cmd.execute()?;
        println!("{output}");
        Ok(())
    }
}

impl MainCmd {
    /// Execute the main command, returning what it would print
    pub fn execute(&self) -> Result<String, CliError> {
        match self {
            Self::Auth(cmd) => cmd.execute(),
            Self::Passkey(cmd) => cmd.execute(),
            Self::Account(cmd) => cmd.execute(),
            Self::Endpoints(cmd) => cmd.execute(),
            Self::Job(cmd) => cmd.execute(),
        }
    }
}
