//! Parser for WebAuthn authenticator data.

use alloy_primitives::{Bytes, FixedBytes, B256};

use crate::constants::webauthn::{
    AAGUID_LEN, AUTH_DATA_HEADER_LEN, FLAG_ATTESTED_CREDENTIAL_DATA, FLAG_EXTENSION_DATA,
    FLAG_USER_PRESENT, FLAG_USER_VERIFIED,
};

use super::{CoseKey, PasskeyError};

/// Authenticator data in its WebAuthn layout:
///
/// ```text
/// rpIdHash (32) || flags (1) || signCount (4, big endian) || [attestedCredentialData] || [extensions]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorData<'a> {
    raw: &'a [u8],
    rp_id_hash: B256,
    flags: u8,
    sign_count: u32,
}

/// The attested credential data carried by registration authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    /// Authenticator attestation GUID.
    pub aaguid: FixedBytes<16>,
    /// Credential identifier.
    pub credential_id: Bytes,
    /// Credential public key.
    pub public_key: CoseKey,
}

impl<'a> AuthenticatorData<'a> {
    /// Parses the fixed header. The variable-length tail is only inspected by
    /// [`Self::attested_credential_data`].
    pub fn parse(raw: &'a [u8]) -> Result<Self, PasskeyError> {
        if raw.len() < AUTH_DATA_HEADER_LEN {
            return Err(PasskeyError::MalformedAuthenticatorData("shorter than header"));
        }
        Ok(Self {
            raw,
            rp_id_hash: B256::from_slice(&raw[..32]),
            flags: raw[32],
            sign_count: u32::from_be_bytes([raw[33], raw[34], raw[35], raw[36]]),
        })
    }

    /// SHA-256 of the relying party identifier the authenticator scoped the credential to.
    pub const fn rp_id_hash(&self) -> &B256 {
        &self.rp_id_hash
    }

    /// Raw flags byte.
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Signature counter.
    pub const fn sign_count(&self) -> u32 {
        self.sign_count
    }

    /// Whether the UP flag is set.
    pub const fn is_user_present(&self) -> bool {
        self.flags & FLAG_USER_PRESENT != 0
    }

    /// Whether the UV flag is set.
    pub const fn is_user_verified(&self) -> bool {
        self.flags & FLAG_USER_VERIFIED != 0
    }

    /// Whether the AT flag is set.
    pub const fn has_attested_credential_data(&self) -> bool {
        self.flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0
    }

    /// Whether the ED flag is set.
    pub const fn has_extension_data(&self) -> bool {
        self.flags & FLAG_EXTENSION_DATA != 0
    }

    /// Parses the attested credential data following the header.
    ///
    /// Bytes left after the credential public key are only allowed when the ED flag announces
    /// extensions.
    pub fn attested_credential_data(&self) -> Result<AttestedCredentialData, PasskeyError> {
        if !self.has_attested_credential_data() {
            return Err(PasskeyError::MalformedAuthenticatorData("missing attested credential data"));
        }
        let tail = &self.raw[AUTH_DATA_HEADER_LEN..];
        if tail.len() < AAGUID_LEN + 2 {
            return Err(PasskeyError::MalformedAuthenticatorData("truncated attested credential"));
        }
        let aaguid = FixedBytes::<16>::from_slice(&tail[..AAGUID_LEN]);
        let id_len = u16::from_be_bytes([tail[AAGUID_LEN], tail[AAGUID_LEN + 1]]) as usize;
        let rest = &tail[AAGUID_LEN + 2..];
        if rest.len() < id_len {
            return Err(PasskeyError::MalformedAuthenticatorData("truncated credential id"));
        }
        let (credential_id, mut key_bytes) = rest.split_at(id_len);
        if key_bytes.is_empty() {
            return Err(PasskeyError::MalformedAuthenticatorData("missing credential public key"));
        }

        let public_key = CoseKey::decode(&mut key_bytes)?;
        if !key_bytes.is_empty() && !self.has_extension_data() {
            return Err(PasskeyError::MalformedAuthenticatorData("trailing bytes"));
        }

        Ok(AttestedCredentialData {
            aaguid,
            credential_id: Bytes::copy_from_slice(credential_id),
            public_key,
        })
    }
}
