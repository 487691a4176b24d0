//! Registration and authentication ceremony checks.

use alloy_primitives::{Bytes, B256};
use p256::ecdsa::{signature::Verifier, Signature};
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::constants::webauthn::{ATTESTATION_FORMATS, CLIENT_DATA_TYPE_CREATE, CLIENT_DATA_TYPE_GET};

use super::{AttestationObject, AuthenticatorData, ClientData, PasskeyError, PasskeyPublicKey};

/// Whether an assertion must carry the user-verified flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UserVerification {
    /// The UV flag must be set.
    #[default]
    Required,
    /// The UV flag is reported but not enforced.
    Preferred,
}

/// An authentication ceremony response as returned by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResponse {
    /// Identifier of the credential that signed.
    pub credential_id: Bytes,
    /// Raw authenticator data.
    pub authenticator_data: Bytes,
    /// Raw `clientDataJSON`.
    pub client_data_json: Bytes,
    /// ECDSA signature, DER encoded or fixed-width `r || s`.
    pub signature: Bytes,
}

/// What a successful assertion reports back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionOutcome {
    /// Signature counter of the authenticator.
    pub sign_count: u32,
    /// Whether the UV flag was set.
    pub user_verified: bool,
}

/// Verifies passkey ceremonies for a single relying party.
///
/// The verifier is stateless: the same inputs always produce the same result, and it can be
/// shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasskeyVerifier {
    relying_party: String,
    user_verification: UserVerification,
}

impl PasskeyVerifier {
    /// Creates a verifier for `relying_party` that requires user verification on assertions.
    pub fn new(relying_party: impl Into<String>) -> Self {
        Self { relying_party: relying_party.into(), user_verification: UserVerification::default() }
    }

    /// Sets the user verification policy applied to assertions.
    pub const fn with_user_verification(mut self, user_verification: UserVerification) -> Self {
        self.user_verification = user_verification;
        self
    }

    /// The relying party identifier.
    pub fn relying_party(&self) -> &str {
        &self.relying_party
    }

    /// Verifies a registration ceremony and extracts the credential public key.
    ///
    /// `user_name` is supplied by the caller, since the authenticator output does not carry it.
    pub fn verify_attestation(
        &self,
        attestation_object: &[u8],
        client_data_json: &[u8],
        expected_challenge: &[u8],
        user_name: &str,
    ) -> Result<PasskeyPublicKey, PasskeyError> {
        trace!(target: "omni::passkey", attestation = %alloy_primitives::hex::encode(attestation_object), "verifying attestation");
        ClientData::parse(client_data_json)?.verify(
            CLIENT_DATA_TYPE_CREATE,
            expected_challenge,
            &self.relying_party,
        )?;

        let attestation = AttestationObject::decode(attestation_object)?;
        if !ATTESTATION_FORMATS.contains(&attestation.fmt.as_str()) {
            return Err(PasskeyError::UnsupportedResponse(format!(
                "attestation format {:?}",
                attestation.fmt
            )));
        }

        let auth_data = AuthenticatorData::parse(&attestation.auth_data)?;
        self.check_rp_id_hash(&auth_data)?;
        if !auth_data.is_user_present() {
            return Err(PasskeyError::MalformedAuthenticatorData("user not present"));
        }
        let credential = auth_data.attested_credential_data()?;

        debug!(
            target: "omni::passkey",
            fmt = %attestation.fmt,
            credential_id = %credential.credential_id,
            sign_count = auth_data.sign_count(),
            "attestation verified"
        );
        Ok(PasskeyPublicKey {
            x: credential.public_key.x,
            y: credential.public_key.y,
            credential_id: credential.credential_id,
            user_name: user_name.to_string(),
            aa_guid: credential.aaguid,
            raw_attestation_object: Bytes::copy_from_slice(attestation_object),
            raw_client_data_json: Bytes::copy_from_slice(client_data_json),
        })
    }

    /// Verifies an authentication ceremony against a previously registered key.
    pub fn verify_assertion(
        &self,
        response: &AssertionResponse,
        stored_key: &PasskeyPublicKey,
        expected_challenge: &[u8],
    ) -> Result<AssertionOutcome, PasskeyError> {
        if response.credential_id != stored_key.credential_id {
            warn!(target: "omni::passkey", credential_id = %response.credential_id, "unknown credential");
            return Err(PasskeyError::CredentialIdMismatch);
        }
        ClientData::parse(&response.client_data_json)?.verify(
            CLIENT_DATA_TYPE_GET,
            expected_challenge,
            &self.relying_party,
        )?;

        let auth_data = AuthenticatorData::parse(&response.authenticator_data)?;
        self.check_rp_id_hash(&auth_data)?;
        if !auth_data.is_user_present() {
            return Err(PasskeyError::MalformedAuthenticatorData("user not present"));
        }
        if self.user_verification == UserVerification::Required && !auth_data.is_user_verified() {
            return Err(PasskeyError::UserVerificationRequired);
        }

        let signature = parse_signature(&response.signature)?;
        let verifying_key = stored_key.verifying_key()?;
        let message = signed_message(&response.authenticator_data, &response.client_data_json);
        verifying_key.verify(&message, &signature).map_err(|_| {
            warn!(target: "omni::passkey", credential_id = %response.credential_id, "bad assertion signature");
            PasskeyError::SignatureVerificationFailed
        })?;

        let outcome = AssertionOutcome {
            sign_count: auth_data.sign_count(),
            user_verified: auth_data.is_user_verified(),
        };
        debug!(target: "omni::passkey", ?outcome, "assertion verified");
        Ok(outcome)
    }

    fn check_rp_id_hash(&self, auth_data: &AuthenticatorData<'_>) -> Result<(), PasskeyError> {
        let expected = rp_id_hash(&self.relying_party);
        if auth_data.rp_id_hash() != &expected {
            return Err(PasskeyError::RelyingPartyMismatch {
                expected: self.relying_party.clone(),
                actual: auth_data.rp_id_hash().to_string(),
            });
        }
        Ok(())
    }
}

/// SHA-256 of the relying party identifier, as embedded in authenticator data.
pub fn rp_id_hash(relying_party: &str) -> B256 {
    B256::from_slice(&Sha256::digest(relying_party.as_bytes()))
}

/// The message an authenticator signs: `authenticatorData || sha256(clientDataJSON)`.
pub fn signed_message(authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(authenticator_data.len() + 32);
    message.extend_from_slice(authenticator_data);
    message.extend_from_slice(&Sha256::digest(client_data_json));
    message
}

fn parse_signature(raw: &[u8]) -> Result<Signature, PasskeyError> {
    if raw.len() == 64 {
        return Signature::from_slice(raw).map_err(|_| PasskeyError::MalformedSignature);
    }
    Signature::from_der(raw).map_err(|_| PasskeyError::MalformedSignature)
}
