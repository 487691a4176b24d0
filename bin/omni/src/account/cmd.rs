use alloy_primitives::Address;
use clap::{Args, Subcommand};
use omni_account::{
    provision_account, AccountRepository, CreatedAccount, CredentialSigner, ProvisioningRequest,
};
use tracing::{info, warn};

use crate::{
    auth::load_signing_key,
    common::{CliError, FileCredentialStore, Result, StoreArgs},
    passkey::AttestationArgs,
};

/// Account commands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Verify a passkey registration, delegate an EOA and persist the account
    Provision(ProvisionCmd),
    /// Print a persisted account
    Show(ShowCmd),
    /// List persisted accounts
    List(ListCmd),
}

/// Provision an account
#[derive(Args, Debug)]
pub struct ProvisionCmd {
    #[command(flatten)]
    pub attestation: AttestationArgs,

    /// Chain the delegation is valid on
    #[arg(long = "chain-id")]
    pub chain_id: u64,

    /// Address of the delegated smart-account code
    #[arg(long = "delegate")]
    pub delegate: Address,

    /// Current nonce of the EOA
    #[arg(long = "nonce", default_value = "0")]
    pub nonce: u64,

    /// EOA private key as hex, or a file containing it. A fresh key is generated if omitted
    #[arg(long = "key", env = "OMNI_EOA_KEY", hide_env_values = true)]
    pub key: Option<String>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Show an account
#[derive(Args, Debug)]
pub struct ShowCmd {
    /// EOA address of the account
    #[arg(value_name = "EOA")]
    pub eoa: Address,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// List accounts
#[derive(Args, Debug)]
pub struct ListCmd {
    #[command(flatten)]
    pub store: StoreArgs,
}

impl Cmd {
    /// Runs the command and returns its output.
    pub fn execute(&self) -> Result<String> {
        match self {
            Self::Provision(cmd) => Ok(serde_json::to_string_pretty(&cmd.provision()?)?),
            Self::Show(cmd) => {
                let account = repository(&cmd.store)?.load(cmd.eoa)?;
                Ok(serde_json::to_string_pretty(&account)?)
            }
            Self::List(cmd) => {
                let accounts = repository(&cmd.store)?.list()?;
                Ok(accounts.iter().map(|eoa| eoa.to_checksum(None)).collect::<Vec<_>>().join("\n"))
            }
        }
    }
}

impl ProvisionCmd {
    /// Runs the provisioning flow and persists the result.
    ///
    /// The EOA key is placed in the credential store before signing. A generated key is removed
    /// again if provisioning fails.
    pub fn provision(&self) -> Result<CreatedAccount> {
        let loaded = self.attestation.load()?;
        let request = ProvisioningRequest {
            attestation_object: loaded.attestation_object,
            client_data_json: loaded.client_data_json,
            challenge: loaded.challenge,
            relying_party: self.attestation.rp_id.clone(),
            user_name: self.attestation.user_name.clone(),
            chain_id: self.chain_id,
            delegate_address: self.delegate,
            nonce: self.nonce,
        };

        let store = self.store.open()?;
        let repository = AccountRepository::new(store.clone());
        let generated = self.key.is_none();
        let signer = match &self.key {
            Some(key) => CredentialSigner::import(store, &load_signing_key(key)?)?,
            None => CredentialSigner::generate(store, &mut rand::rngs::OsRng)?,
        };

        let result = provision_account(&request, &signer)
            .map_err(CliError::from)
            .and_then(|account| repository.save(&account).map(|()| account).map_err(Into::into));
        match result {
            Ok(account) => {
                info!(target: "omni::cli", eoa = %account.eoa_address(), "account persisted");
                Ok(account)
            }
            Err(err) => {
                if generated {
                    if let Err(forget) = signer.forget() {
                        warn!(target: "omni::cli", %forget, "failed to remove eoa key");
                    }
                }
                Err(err)
            }
        }
    }
}

/// Opens the account repository at `store`.
pub fn repository(store: &StoreArgs) -> Result<AccountRepository<FileCredentialStore>> {
    Ok(AccountRepository::new(store.open()?))
}
