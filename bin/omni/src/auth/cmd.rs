use alloy_primitives::{hex, Address, B256};
use clap::{Args, Subcommand};
use k256::ecdsa::SigningKey;
use omni_account::{authorization_digest, build_authorization, AuthorizationSigned};
use serde::Serialize;
use tracing::info;

use crate::common::{decode_hex, hex_or_file, CliError, Result};

/// EIP-7702 authorization commands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the signing digest of an authorization
    Digest(AuthorizationArgs),
    /// Sign an authorization with a raw secp256k1 key
    Sign(SignCmd),
    /// Decode and validate an RLP-encoded signed authorization
    Decode(DecodeCmd),
}

/// The unsigned authorization tuple.
#[derive(Args, Debug, Clone)]
pub struct AuthorizationArgs {
    /// Chain the delegation is valid on
    #[arg(long = "chain-id")]
    pub chain_id: u64,

    /// Address of the delegated smart-account code
    #[arg(long = "delegate")]
    pub delegate: Address,

    /// Current nonce of the EOA
    #[arg(long = "nonce", default_value = "0")]
    pub nonce: u64,
}

/// Sign an authorization
#[derive(Args, Debug)]
pub struct SignCmd {
    #[command(flatten)]
    pub authorization: AuthorizationArgs,

    /// EOA private key as hex, or a file containing it
    #[arg(long = "key", env = "OMNI_EOA_KEY", hide_env_values = true)]
    pub key: String,
}

/// Decode a signed authorization
#[derive(Args, Debug)]
pub struct DecodeCmd {
    /// RLP encoding of the signed authorization as hex
    #[arg(value_name = "RLP")]
    pub rlp: String,
}

/// A signed authorization together with what it implies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationReport {
    /// The signed authorization
    pub authorization: AuthorizationSigned,
    /// The EOA that signed it
    pub authority: Address,
    /// The digest that was signed
    pub digest: B256,
    /// RLP wire encoding
    pub rlp: String,
}

impl AuthorizationReport {
    /// Recovers the authority of `authorization` and collects the report.
    pub fn new(authorization: AuthorizationSigned) -> Result<Self> {
        Ok(Self {
            authority: authorization.recover_authority()?,
            digest: authorization.signature_hash(),
            rlp: hex::encode_prefixed(authorization.encode_wire()),
            authorization,
        })
    }
}

impl Cmd {
    /// Runs the command and returns its output.
    pub fn execute(&self) -> Result<String> {
        match self {
            Self::Digest(args) => {
                Ok(authorization_digest(args.chain_id, args.delegate, args.nonce).to_string())
            }
            Self::Sign(cmd) => cmd.execute(),
            Self::Decode(cmd) => cmd.execute(),
        }
    }
}

impl SignCmd {
    /// Signs the authorization and reports it as JSON.
    pub fn execute(&self) -> Result<String> {
        let key = load_signing_key(&self.key)?;
        let args = &self.authorization;
        let signed = build_authorization(args.chain_id, args.delegate, args.nonce, &key)?;
        let report = AuthorizationReport::new(signed)?;
        info!(target: "omni::cli", authority = %report.authority, "authorization signed");
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl DecodeCmd {
    /// Decodes, validates and reports the authorization as JSON.
    pub fn execute(&self) -> Result<String> {
        let bytes = decode_hex(&self.rlp)?;
        let signed = AuthorizationSigned::decode_wire(&bytes)?;
        Ok(serde_json::to_string_pretty(&AuthorizationReport::new(signed)?)?)
    }
}

/// Reads a secp256k1 key given as hex or as a file holding hex.
pub fn load_signing_key(value: &str) -> Result<SigningKey> {
    let bytes = hex_or_file(value)?;
    SigningKey::from_slice(&bytes)
        .map_err(|_| CliError::InvalidInput("EOA key is not a valid secp256k1 scalar".to_string()))
}
