//! EIP-7702 set-code authorizations.
//!
//! An authorization delegates the code of an externally owned account to `delegate_address` on
//! one chain, for one account nonce. The EOA signs
//! `keccak256(0x05 || rlp([chain_id, delegate_address, nonce]))` and the signed tuple travels as
//! `rlp([chain_id, delegate_address, nonce, y_parity, r, s])`.

use alloy_primitives::{keccak256, Address, B256};
use alloy_rlp::{Encodable, RlpEncodable};
use tracing::{debug, warn};

use crate::constants::eip7702::MAGIC;

mod error;
pub use error::*;

mod signed;
pub use signed::*;

mod signer;
pub use signer::*;

/// An unsigned authorization tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, RlpEncodable)]
pub struct Authorization {
    /// The chain the delegation is valid on.
    pub chain_id: u64,
    /// Address of the smart-account code the EOA delegates to.
    pub delegate_address: Address,
    /// Nonce of the EOA at the time the authorization is applied.
    pub nonce: u64,
}

impl Authorization {
    /// Returns the digest the EOA signs.
    pub fn signature_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.length() + 1);
        buf.push(MAGIC);
        self.encode(&mut buf);
        keccak256(buf)
    }
}

/// Computes the EIP-7702 signing digest of `(chain_id, delegate_address, nonce)`.
pub fn authorization_digest(chain_id: u64, delegate_address: Address, nonce: u64) -> B256 {
    Authorization { chain_id, delegate_address, nonce }.signature_hash()
}

/// Builds and signs an authorization delegating `signer`'s account to `delegate_address`.
///
/// Chain id `0` is rejected even though EIP-7702 reads it as "any chain": an account provisioned
/// here is always bound to a single chain.
pub fn build_authorization<S: AuthorizationSigner>(
    chain_id: u64,
    delegate_address: Address,
    nonce: u64,
    signer: &S,
) -> Result<AuthorizationSigned, AuthorizationError> {
    if chain_id == 0 {
        return Err(AuthorizationError::InvalidChainId);
    }
    if delegate_address.is_zero() {
        return Err(AuthorizationError::ZeroDelegate);
    }

    let authorization = Authorization { chain_id, delegate_address, nonce };
    let digest = authorization.signature_hash();
    let signature = signer.sign_digest(&digest).map_err(|err| {
        warn!(target: "omni::authorization", %err, "signer failed");
        AuthorizationError::AuthorizationFailed { code: err.code(), message: Some(err.to_string()) }
    })?;

    let signed = AuthorizationSigned::new(authorization, signature);
    signed.validate()?;
    debug!(
        target: "omni::authorization",
        chain_id,
        %delegate_address,
        nonce,
        %digest,
        "authorization signed"
    );
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::eoa_signing_key;
    use alloy_primitives::{address, b256};

    const DELEGATE: Address = address!("63c0c19a282a1b52b07dd5a65b58948a07dae32b");

    #[test]
    fn test_authorization_digest_known_answers() {
        assert_eq!(
            authorization_digest(1, DELEGATE, 0),
            b256!("f743228656c74db57ce53cafe32c6023a8aad310a4bcc217d125f9f7796520fc")
        );
        assert_eq!(
            authorization_digest(10, DELEGATE, 7),
            b256!("7001995d79aa34677b3551762dc32789eec12f13fdda87762498e6c916b55e1b")
        );
        assert_eq!(
            authorization_digest(137, address!("00000000000000000000000000000000000000aa"), 1),
            b256!("c4b5040cc421051c46424da4f747da3ed0e4bb5c2287f2ae497bc0b28011a56c")
        );
    }

    #[test]
    fn test_authorization_digest_binds_every_field() {
        let base = authorization_digest(1, DELEGATE, 0);
        assert_eq!(base, authorization_digest(1, DELEGATE, 0));
        assert_ne!(base, authorization_digest(2, DELEGATE, 0));
        assert_ne!(base, authorization_digest(1, Address::repeat_byte(0x11), 0));
        assert_ne!(base, authorization_digest(1, DELEGATE, 1));
    }

    #[test]
    fn test_build_authorization_recovers_signer() {
        let key = eoa_signing_key(1);
        let signed = build_authorization(1, DELEGATE, 0, &key).unwrap();

        assert_eq!(signed.chain_id, 1);
        assert_eq!(signed.delegate_address, DELEGATE);
        assert_eq!(signed.nonce, 0);
        assert!(signed.y_parity <= 1);
        assert_eq!(
            signed.recover_authority().unwrap(),
            address!("7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
        );
    }

    #[test]
    fn test_build_authorization_rejects_chain_zero() {
        assert_eq!(
            build_authorization(0, DELEGATE, 0, &eoa_signing_key(1)),
            Err(AuthorizationError::InvalidChainId)
        );
    }

    #[test]
    fn test_build_authorization_rejects_zero_delegate() {
        assert_eq!(
            build_authorization(1, Address::ZERO, 0, &eoa_signing_key(1)),
            Err(AuthorizationError::ZeroDelegate)
        );
    }

    #[test]
    fn test_build_authorization_propagates_signer_failure() {
        struct Locked;

        impl AuthorizationSigner for Locked {
            fn address(&self) -> Address {
                Address::ZERO
            }

            fn sign_digest(&self, _digest: &B256) -> Result<RecoverableSignature, SignerError> {
                Err(SignerError::Store(crate::CredentialStoreError::UnexpectedStatus(-25308)))
            }
        }

        let err = build_authorization(1, DELEGATE, 0, &Locked).unwrap_err();
        assert!(matches!(
            err,
            AuthorizationError::AuthorizationFailed { code: -25308, message: Some(_) }
        ));
    }
}
