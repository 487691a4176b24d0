//! Signing capabilities for EOA authorities.

use alloy_primitives::{Address, B256, U256};
use auto_impl::auto_impl;
use k256::{ecdsa::SigningKey, elliptic_curve::rand_core::CryptoRngCore};
use tracing::debug;

use crate::{constants::store::EOA_KEY_SERVICE, store_account, CredentialStore, CredentialStoreError};

use super::address_from_verifying_key;

/// A secp256k1 signature split into its recoverable components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature {
    /// Parity of the `y` coordinate of the signature point.
    pub y_parity: u8,
    /// Signature `r` scalar.
    pub r: U256,
    /// Signature `s` scalar.
    pub s: U256,
}

/// Errors raised by an [`AuthorizationSigner`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// The key could not be read from or written to custody.
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
    /// The key material in custody is not a secp256k1 key of the expected account.
    #[error("invalid signing key")]
    InvalidKey,
    /// The signing primitive failed.
    #[error("signing failed")]
    Signing,
}

impl SignerError {
    /// Numeric code surfaced in [`AuthorizationFailed`](crate::AuthorizationError).
    ///
    /// Store status codes pass through unchanged.
    pub const fn code(&self) -> i64 {
        match self {
            Self::Store(CredentialStoreError::UnexpectedStatus(status)) => *status as i64,
            Self::Store(_) => 1,
            Self::InvalidKey => 2,
            Self::Signing => 3,
        }
    }
}

/// The signing capability of an externally owned account.
#[auto_impl(&, Box, Arc)]
pub trait AuthorizationSigner {
    /// Address of the account.
    fn address(&self) -> Address;

    /// Signs a 32-byte digest without hashing it again.
    fn sign_digest(&self, digest: &B256) -> Result<RecoverableSignature, SignerError>;
}

impl AuthorizationSigner for SigningKey {
    fn address(&self) -> Address {
        address_from_verifying_key(self.verifying_key())
    }

    fn sign_digest(&self, digest: &B256) -> Result<RecoverableSignature, SignerError> {
        let (signature, recovery_id) =
            self.sign_prehash_recoverable(digest.as_slice()).map_err(|_| SignerError::Signing)?;
        let (r, s) = signature.split_bytes();
        Ok(RecoverableSignature {
            y_parity: recovery_id.is_y_odd() as u8,
            r: U256::from_be_slice(&r),
            s: U256::from_be_slice(&s),
        })
    }
}

/// A signer whose key lives in a [`CredentialStore`].
///
/// The key is stored under `(account = checksummed address, service = "omni.eoa-key")` and read
/// back for every signature, so it is never held longer than one signing operation.
#[derive(derive_more::Debug)]
pub struct CredentialSigner<S> {
    #[debug(ignore)]
    store: S,
    address: Address,
}

impl<S: CredentialStore> CredentialSigner<S> {
    /// Generates a fresh key and places it in custody.
    pub fn generate<R: CryptoRngCore>(store: S, rng: &mut R) -> Result<Self, SignerError> {
        Self::import(store, &SigningKey::random(rng))
    }

    /// Places an existing key in custody.
    pub fn import(store: S, key: &SigningKey) -> Result<Self, SignerError> {
        let address = key.address();
        store.save(&key.to_bytes(), &store_account(&address), EOA_KEY_SERVICE)?;
        debug!(target: "omni::authorization", %address, "eoa key stored");
        Ok(Self { store, address })
    }

    /// Opens the key of `address` already in custody.
    pub fn open(store: S, address: Address) -> Result<Self, SignerError> {
        let signer = Self { store, address };
        signer.load_key()?;
        Ok(signer)
    }

    /// Removes the key from custody.
    pub fn forget(self) -> Result<(), SignerError> {
        self.store.delete(&store_account(&self.address), EOA_KEY_SERVICE)?;
        Ok(())
    }

    fn load_key(&self) -> Result<SigningKey, SignerError> {
        let bytes = self.store.read(&store_account(&self.address), EOA_KEY_SERVICE)?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| SignerError::InvalidKey)?;
        if key.address() != self.address {
            return Err(SignerError::InvalidKey);
        }
        Ok(key)
    }
}

impl<S: CredentialStore> AuthorizationSigner for CredentialSigner<S> {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &B256) -> Result<RecoverableSignature, SignerError> {
        self.load_key()?.sign_digest(digest)
    }
}
