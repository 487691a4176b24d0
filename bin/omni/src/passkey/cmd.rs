use std::path::PathBuf;

use alloy_primitives::Bytes;
use clap::{Args, Subcommand};
use omni_account::{PasskeyPublicKey, PasskeyVerifier};

use crate::common::{require_hex, Result};

/// Passkey ceremony commands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Verify a registration ceremony and print the credential public key
    VerifyAttestation(VerifyAttestationCmd),
}

/// Output of a passkey registration ceremony.
#[derive(Args, Debug, Clone)]
pub struct AttestationArgs {
    /// Attestation object as hex
    #[arg(long = "attestation")]
    pub attestation: Option<String>,

    /// File containing the attestation object as hex. If '-' is specified, it is read from stdin
    #[arg(long = "attestation-file", conflicts_with = "attestation")]
    pub attestation_file: Option<PathBuf>,

    /// `clientDataJSON` bytes as hex
    #[arg(long = "client-data")]
    pub client_data: Option<String>,

    /// File containing the `clientDataJSON` bytes as hex
    #[arg(long = "client-data-file", conflicts_with = "client_data")]
    pub client_data_file: Option<PathBuf>,

    /// Challenge issued for the ceremony as hex
    #[arg(long = "challenge")]
    pub challenge: String,

    /// Relying party identifier
    #[arg(long = "rp-id")]
    pub rp_id: String,

    /// User name the passkey is registered for
    #[arg(long = "user-name")]
    pub user_name: String,
}

/// Raw ceremony bytes loaded from [`AttestationArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAttestation {
    /// Attestation object
    pub attestation_object: Bytes,
    /// `clientDataJSON`
    pub client_data_json: Bytes,
    /// Expected challenge
    pub challenge: Bytes,
}

impl AttestationArgs {
    /// Loads the hex inputs.
    pub fn load(&self) -> Result<LoadedAttestation> {
        Ok(LoadedAttestation {
            attestation_object: require_hex(
                "attestation",
                self.attestation.as_deref(),
                self.attestation_file.as_deref(),
            )?,
            client_data_json: require_hex(
                "client-data",
                self.client_data.as_deref(),
                self.client_data_file.as_deref(),
            )?,
            challenge: require_hex("challenge", Some(&self.challenge), None)?,
        })
    }

    /// Verifies the ceremony against the relying party.
    pub fn verify(&self) -> Result<PasskeyPublicKey> {
        let loaded = self.load()?;
        Ok(PasskeyVerifier::new(self.rp_id.as_str()).verify_attestation(
            &loaded.attestation_object,
            &loaded.client_data_json,
            &loaded.challenge,
            &self.user_name,
        )?)
    }
}

/// Verify a registration ceremony
#[derive(Args, Debug)]
pub struct VerifyAttestationCmd {
    #[command(flatten)]
    pub attestation: AttestationArgs,
}

impl Cmd {
    /// Runs the command and returns its output.
    pub fn execute(&self) -> Result<String> {
        match self {
            Self::VerifyAttestation(cmd) => {
                Ok(serde_json::to_string_pretty(&cmd.attestation.verify()?)?)
            }
        }
    }
}

/// Arguments carrying a registration of `fixture` for the user `alice`.
#[cfg(test)]
pub(crate) fn attestation_args(
    fixture: &omni_account::test_utils::PasskeyFixture,
    rp_id: &str,
) -> AttestationArgs {
    use alloy_primitives::hex;
    use omni_account::test_utils::PasskeyFixture;

    let (attestation, client_data) = fixture.attestation(PasskeyFixture::REGISTRATION_CHALLENGE);
    AttestationArgs {
        attestation: Some(hex::encode(attestation)),
        attestation_file: None,
        client_data: Some(hex::encode_prefixed(client_data)),
        client_data_file: None,
        challenge: hex::encode(PasskeyFixture::REGISTRATION_CHALLENGE),
        rp_id: rp_id.to_string(),
        user_name: "alice".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use omni_account::{test_utils::PasskeyFixture, PasskeyError};

    use super::*;
    use crate::common::CliError;

    #[test]
    fn test_verify_attestation_prints_public_key() {
        let fixture = PasskeyFixture::new("example.com");
        let cmd = Cmd::VerifyAttestation(VerifyAttestationCmd {
            attestation: attestation_args(&fixture, "example.com"),
        });
        let key: PasskeyPublicKey = serde_json::from_str(&cmd.execute().unwrap()).unwrap();
        assert_eq!(key, fixture.public_key("alice"));
    }

    #[test]
    fn test_wrong_relying_party_is_reported() {
        let fixture = PasskeyFixture::new("example.com");
        let err = attestation_args(&fixture, "evil.com").verify().unwrap_err();
        assert!(matches!(err, CliError::Passkey(PasskeyError::RelyingPartyMismatch { .. })));
    }

    #[test]
    fn test_missing_attestation_is_invalid_input() {
        let fixture = PasskeyFixture::new("example.com");
        let mut args = attestation_args(&fixture, "example.com");
        args.attestation = None;
        assert!(matches!(args.load(), Err(CliError::InvalidInput(_))));
    }
}
