//! The P-256 credential public key extracted at registration.

use alloy_primitives::{Bytes, FixedBytes, B256};
use p256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};

use super::PasskeyError;

/// The public half of a passkey credential, produced by a successful registration ceremony.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyPublicKey {
    /// Uncompressed x coordinate of the P-256 public key.
    pub x: B256,
    /// Uncompressed y coordinate of the P-256 public key.
    pub y: B256,
    /// Credential identifier chosen by the authenticator.
    #[serde(rename = "credentialID")]
    pub credential_id: Bytes,
    /// User name the credential was registered for.
    pub user_name: String,
    /// Authenticator attestation GUID.
    pub aa_guid: FixedBytes<16>,
    /// The attestation object exactly as returned by the authenticator.
    pub raw_attestation_object: Bytes,
    /// The client data exactly as returned by the authenticator.
    #[serde(rename = "rawClientDataJSON")]
    pub raw_client_data_json: Bytes,
}

impl PasskeyPublicKey {
    /// Returns the SEC1 uncompressed encoding `0x04 || x || y`.
    pub fn sec1_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(self.x.as_slice());
        out[33..].copy_from_slice(self.y.as_slice());
        out
    }

    /// Returns the ECDSA verifying key. Fails if either coordinate is zero or the point is not on
    /// the P-256 curve.
    pub fn verifying_key(&self) -> Result<VerifyingKey, PasskeyError> {
        if self.x.is_zero() || self.y.is_zero() {
            return Err(PasskeyError::MalformedCoseKey("zero coordinate"));
        }
        VerifyingKey::from_sec1_bytes(&self.sec1_bytes())
            .map_err(|_| PasskeyError::MalformedCoseKey("point is not on P-256"))
    }
}
