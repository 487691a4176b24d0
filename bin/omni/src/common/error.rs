use std::path::PathBuf;

use alloy_primitives::hex::FromHexError;
use omni_account::{
    AccountError, AuthorizationError, CredentialStoreError, EndpointError, PasskeyError,
    SignerError,
};

/// Error types for omni subcommands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Failed to read an input file
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The passkey ceremony did not verify
    #[error("Passkey verification failed: {0}")]
    Passkey(#[from] PasskeyError),

    /// The authorization could not be built or decoded
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// The EOA key could not be used
    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    /// Account provisioning or persistence failed
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// The credential store failed
    #[error("Credential store error: {0}")]
    Store(#[from] CredentialStoreError),

    /// The credential store directory could not be prepared
    #[error("Failed to open credential store at {}: {source}", path.display())]
    StoreInit {
        /// Store directory
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// No store directory was given and the platform has no data directory
    #[error("No data directory available, pass --store")]
    NoDataDir,

    /// Endpoint configuration or lookup failed
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    /// JSON output could not be produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for omni subcommands
pub type Result<T> = std::result::Result<T, CliError>;
