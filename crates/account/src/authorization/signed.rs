//! Signed authorizations: validation, authority recovery and wire encoding.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::constants::eip7702::{SECP256K1N, SECP256K1N_HALF};

use super::{Authorization, AuthorizationError, RecoverableSignature};

/// A signed EIP-7702 authorization, in the field order of its wire encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationSigned {
    /// The chain the delegation is valid on.
    pub chain_id: u64,
    /// Address of the delegated code.
    pub delegate_address: Address,
    /// Nonce of the authority.
    pub nonce: u64,
    /// Parity of the `y` coordinate of the signature point.
    pub y_parity: u8,
    /// Signature `r` scalar.
    pub r: U256,
    /// Signature `s` scalar.
    pub s: U256,
}

impl AuthorizationSigned {
    /// Attaches `signature` to `authorization`.
    pub const fn new(authorization: Authorization, signature: RecoverableSignature) -> Self {
        Self {
            chain_id: authorization.chain_id,
            delegate_address: authorization.delegate_address,
            nonce: authorization.nonce,
            y_parity: signature.y_parity,
            r: signature.r,
            s: signature.s,
        }
    }

    /// The unsigned tuple.
    pub const fn authorization(&self) -> Authorization {
        Authorization {
            chain_id: self.chain_id,
            delegate_address: self.delegate_address,
            nonce: self.nonce,
        }
    }

    /// The digest the authority signed.
    pub fn signature_hash(&self) -> B256 {
        self.authorization().signature_hash()
    }

    /// Checks the signature invariants: `y_parity` is 0 or 1, `r` is non-zero and below the
    /// secp256k1 order, and `s` is non-zero and in the lower half of the order.
    pub fn validate(&self) -> Result<(), AuthorizationError> {
        if self.y_parity > 1 {
            return Err(AuthorizationError::InvalidSignature("y parity is not 0 or 1"));
        }
        if self.r.is_zero() || self.r >= SECP256K1N {
            return Err(AuthorizationError::InvalidSignature("r out of range"));
        }
        if self.s.is_zero() || self.s >= SECP256K1N {
            return Err(AuthorizationError::InvalidSignature("s out of range"));
        }
        if self.s > SECP256K1N_HALF {
            return Err(AuthorizationError::InvalidSignature("s is not in the lower half"));
        }
        Ok(())
    }

    /// Recovers the address of the EOA that signed the authorization.
    pub fn recover_authority(&self) -> Result<Address, AuthorizationError> {
        self.validate()?;

        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        sig_bytes[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| AuthorizationError::RecoveryFailed)?;
        let recovery_id =
            RecoveryId::try_from(self.y_parity).map_err(|_| AuthorizationError::RecoveryFailed)?;

        let digest = self.signature_hash();
        let key = VerifyingKey::recover_from_prehash(&digest[..], &signature, recovery_id)
            .map_err(|_| AuthorizationError::RecoveryFailed)?;
        Ok(address_from_verifying_key(&key))
    }

    /// Encodes the authorization as an RLP list, as it appears in an authorization list.
    pub fn encode_wire(&self) -> Vec<u8> {
        alloy_rlp::encode(self)
    }

    /// Decodes an authorization from its RLP encoding. The input must hold exactly one tuple that
    /// satisfies [`Self::validate`].
    pub fn decode_wire(mut bytes: &[u8]) -> Result<Self, AuthorizationError> {
        let authorization = Self::decode(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(AuthorizationError::MalformedEncoding(alloy_rlp::Error::UnexpectedLength));
        }
        authorization.validate()?;
        Ok(authorization)
    }
}

/// Derives the Ethereum address of a secp256k1 public key: the last 20 bytes of the keccak256 of
/// its uncompressed coordinates.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
