use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ciborium::Value;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};

use crate::{
    constants::webauthn::{
        CLIENT_DATA_TYPE_CREATE, CLIENT_DATA_TYPE_GET, FLAG_ATTESTED_CREDENTIAL_DATA,
        FLAG_USER_PRESENT, FLAG_USER_VERIFIED,
    },
    rp_id_hash, signed_message, AssertionResponse, PasskeyPublicKey, ProvisioningRequest,
};

/// A software authenticator producing real ES256 registration and authentication responses.
#[derive(Debug, Clone)]
pub struct PasskeyFixture {
    signing_key: SigningKey,
    rp_id: String,
    credential_id: Bytes,
    aaguid: FixedBytes<16>,
    format: String,
}

impl PasskeyFixture {
    /// Challenge used by [`Self::public_key`] and [`Self::provisioning_request`].
    pub const REGISTRATION_CHALLENGE: &'static [u8] = b"omni-registration";

    /// Creates an authenticator scoped to `rp_id` with a fixed key.
    pub fn new(rp_id: &str) -> Self {
        Self::with_seed(rp_id, 0x42)
    }

    /// Creates an authenticator whose key scalar is `seed` repeated.
    pub fn with_seed(rp_id: &str, seed: u8) -> Self {
        Self {
            signing_key: SigningKey::from_slice(&[seed; 32]).expect("valid scalar"),
            rp_id: rp_id.to_string(),
            credential_id: Bytes::copy_from_slice(&[seed; 20]),
            aaguid: FixedBytes::repeat_byte(0xad),
            format: "none".to_string(),
        }
    }

    /// Overrides the attestation statement format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    /// The x coordinate of the credential key.
    pub fn x(&self) -> B256 {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        B256::from_slice(point.x().expect("uncompressed point"))
    }

    /// The y coordinate of the credential key.
    pub fn y(&self) -> B256 {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        B256::from_slice(point.y().expect("uncompressed point"))
    }

    /// The credential id.
    pub fn credential_id(&self) -> Bytes {
        self.credential_id.clone()
    }

    /// The authenticator attestation GUID.
    pub const fn aaguid(&self) -> FixedBytes<16> {
        self.aaguid
    }

    /// The COSE encoding of the credential key.
    pub fn cose_key(&self) -> Vec<u8> {
        encode(&Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer(3.into()), Value::Integer((-7).into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(self.x().to_vec())),
            (Value::Integer((-3).into()), Value::Bytes(self.y().to_vec())),
        ]))
    }

    /// `clientDataJSON` for a ceremony of type `ty` from `https://<rp_id>`.
    pub fn client_data(&self, ty: &str, challenge: &[u8]) -> Bytes {
        format!(
            r#"{{"type":"{ty}","challenge":"{}","origin":"https://{}","crossOrigin":false}}"#,
            URL_SAFE_NO_PAD.encode(challenge),
            self.rp_id
        )
        .into_bytes()
        .into()
    }

    /// Authenticator data with the given flags and counter. The attested credential data is
    /// appended when `flags` has the AT bit.
    pub fn authenticator_data(&self, flags: u8, sign_count: u32) -> Vec<u8> {
        let mut data = rp_id_hash(&self.rp_id).to_vec();
        data.push(flags);
        data.extend_from_slice(&sign_count.to_be_bytes());
        if flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0 {
            data.extend_from_slice(self.aaguid.as_slice());
            data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(&self.credential_id);
            data.extend_from_slice(&self.cose_key());
        }
        data
    }

    /// Wraps `auth_data` into an attestation object.
    pub fn attestation_object(&self, auth_data: Vec<u8>) -> Bytes {
        encode(&Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text(self.format.clone())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]))
        .into()
    }

    /// A registration response: `(attestationObject, clientDataJSON)`.
    pub fn attestation(&self, challenge: &[u8]) -> (Bytes, Bytes) {
        let flags = FLAG_USER_PRESENT | FLAG_USER_VERIFIED | FLAG_ATTESTED_CREDENTIAL_DATA;
        (
            self.attestation_object(self.authenticator_data(flags, 0)),
            self.client_data(CLIENT_DATA_TYPE_CREATE, challenge),
        )
    }

    /// The public key a verifier extracts from [`Self::attestation`] of
    /// [`Self::REGISTRATION_CHALLENGE`].
    pub fn public_key(&self, user_name: &str) -> PasskeyPublicKey {
        let (raw_attestation_object, raw_client_data_json) =
            self.attestation(Self::REGISTRATION_CHALLENGE);
        PasskeyPublicKey {
            x: self.x(),
            y: self.y(),
            credential_id: self.credential_id(),
            user_name: user_name.to_string(),
            aa_guid: self.aaguid,
            raw_attestation_object,
            raw_client_data_json,
        }
    }

    /// An authentication response signed over `challenge`, with a DER signature.
    pub fn assertion(
        &self,
        challenge: &[u8],
        sign_count: u32,
        user_verified: bool,
    ) -> AssertionResponse {
        let flags = if user_verified {
            FLAG_USER_PRESENT | FLAG_USER_VERIFIED
        } else {
            FLAG_USER_PRESENT
        };
        let authenticator_data = self.authenticator_data(flags, sign_count);
        let client_data_json = self.client_data(CLIENT_DATA_TYPE_GET, challenge);
        let signature: Signature =
            self.signing_key.sign(&signed_message(&authenticator_data, &client_data_json));
        AssertionResponse {
            credential_id: self.credential_id(),
            authenticator_data: authenticator_data.into(),
            client_data_json,
            signature: Bytes::copy_from_slice(signature.to_der().as_bytes()),
        }
    }

    /// A provisioning request carrying a registration of [`Self::REGISTRATION_CHALLENGE`].
    pub fn provisioning_request(
        &self,
        user_name: &str,
        chain_id: u64,
        delegate_address: Address,
        nonce: u64,
    ) -> ProvisioningRequest {
        let (attestation_object, client_data_json) =
            self.attestation(Self::REGISTRATION_CHALLENGE);
        ProvisioningRequest {
            attestation_object,
            client_data_json,
            challenge: Bytes::from_static(Self::REGISTRATION_CHALLENGE),
            relying_party: self.rp_id.clone(),
            user_name: user_name.to_string(),
            chain_id,
            delegate_address,
            nonce,
        }
    }
}

fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).expect("writing to a vec");
    out
}
