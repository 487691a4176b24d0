//! Provisioned smart accounts and their persistence.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    build_authorization,
    constants::store::{ACCOUNT_INDEX_ACCOUNT, ACCOUNT_INDEX_SERVICE, ACCOUNT_SERVICE},
    store_account, AuthorizationError, AuthorizationSigned, AuthorizationSigner, CredentialStore,
    CredentialStoreError, PasskeyError, PasskeyPublicKey, PasskeyVerifier,
};

/// Errors raised while provisioning or persisting an account.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// The passkey ceremony did not verify.
    #[error(transparent)]
    Passkey(#[from] PasskeyError),
    /// The authorization could not be built or is invalid.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    /// The authorization was signed by a different account.
    #[error("authorization signed by {recovered}, expected {expected}")]
    AuthorityMismatch {
        /// The account the bundle claims
        expected: Address,
        /// The signer recovered from the authorization
        recovered: Address,
    },
    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
    /// An account for this EOA is already persisted.
    #[error("account {0} already exists")]
    DuplicateAccount(Address),
}

/// An EOA bound to a passkey and delegated to smart-account code.
///
/// The only way to obtain one is [`CreatedAccount::new`] (directly, through
/// [`provision_account`], or by deserializing), so every instance holds a valid key and an
/// authorization signed by its own EOA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CreatedAccountRecord")]
pub struct CreatedAccount {
    eoa_address: Address,
    passkey: PasskeyPublicKey,
    signed_authorization: AuthorizationSigned,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedAccountRecord {
    eoa_address: Address,
    passkey: PasskeyPublicKey,
    signed_authorization: AuthorizationSigned,
}

impl TryFrom<CreatedAccountRecord> for CreatedAccount {
    type Error = AccountError;

    fn try_from(record: CreatedAccountRecord) -> Result<Self, Self::Error> {
        Self::new(record.eoa_address, record.passkey, record.signed_authorization)
    }
}

impl CreatedAccount {
    /// Bundles the three parts of an account, checking that the passkey is a usable P-256 key
    /// and that `signed_authorization` was signed by `eoa_address`.
    pub fn new(
        eoa_address: Address,
        passkey: PasskeyPublicKey,
        signed_authorization: AuthorizationSigned,
    ) -> Result<Self, AccountError> {
        passkey.verifying_key()?;
        let recovered = signed_authorization.recover_authority()?;
        if recovered != eoa_address {
            return Err(AccountError::AuthorityMismatch { expected: eoa_address, recovered });
        }
        Ok(Self { eoa_address, passkey, signed_authorization })
    }

    /// The externally owned account.
    pub const fn eoa_address(&self) -> Address {
        self.eoa_address
    }

    /// The passkey that controls the account.
    pub const fn passkey(&self) -> &PasskeyPublicKey {
        &self.passkey
    }

    /// The delegation of the EOA to smart-account code.
    pub const fn signed_authorization(&self) -> &AuthorizationSigned {
        &self.signed_authorization
    }
}

/// Inputs of [`provision_account`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    /// Attestation object returned by the registration ceremony.
    pub attestation_object: Bytes,
    /// `clientDataJSON` returned by the registration ceremony.
    pub client_data_json: Bytes,
    /// The challenge issued for the ceremony.
    pub challenge: Bytes,
    /// Relying party identifier.
    pub relying_party: String,
    /// User name the passkey is registered for.
    pub user_name: String,
    /// Chain the delegation is scoped to.
    pub chain_id: u64,
    /// Smart-account code to delegate to.
    pub delegate_address: Address,
    /// Current nonce of the EOA.
    pub nonce: u64,
}

/// Verifies the passkey registration, signs the delegation with `signer` and bundles both into a
/// [`CreatedAccount`] owned by `signer`'s address.
pub fn provision_account<S: AuthorizationSigner>(
    request: &ProvisioningRequest,
    signer: &S,
) -> Result<CreatedAccount, AccountError> {
    let passkey = PasskeyVerifier::new(request.relying_party.as_str()).verify_attestation(
        &request.attestation_object,
        &request.client_data_json,
        &request.challenge,
        &request.user_name,
    )?;
    let authorization =
        build_authorization(request.chain_id, request.delegate_address, request.nonce, signer)?;
    let account = CreatedAccount::new(signer.address(), passkey, authorization)?;
    info!(
        target: "omni::account",
        eoa = %account.eoa_address(),
        chain_id = request.chain_id,
        delegate = %request.delegate_address,
        "account provisioned"
    );
    Ok(account)
}

/// Persists [`CreatedAccount`]s in a [`CredentialStore`].
///
/// Each account is stored as JSON under `(account = checksummed EOA, service = "omni.account")`.
/// A separate index record lists every stored EOA. The EOA is the unique identifier: saving a
/// second account for the same EOA fails.
#[derive(derive_more::Debug)]
pub struct AccountRepository<S> {
    #[debug(ignore)]
    store: S,
}

impl<S: CredentialStore> AccountRepository<S> {
    /// Creates a repository over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a new account.
    pub fn save(&self, account: &CreatedAccount) -> Result<(), AccountError> {
        let eoa = account.eoa_address();
        let key = store_account(&eoa);
        match self.store.read(&key, ACCOUNT_SERVICE) {
            Ok(_) => {
                warn!(target: "omni::account", %eoa, "duplicate account");
                return Err(AccountError::DuplicateAccount(eoa));
            }
            Err(CredentialStoreError::DataNotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let data = serde_json::to_vec(account).map_err(|_| CredentialStoreError::InvalidData)?;
        self.store.save(&data, &key, ACCOUNT_SERVICE)?;

        // An unlisted record would block every later save of this EOA, so drop it.
        if let Err(err) = self.add_to_index(eoa) {
            warn!(target: "omni::account", %eoa, %err, "index update failed, removing record");
            if let Err(cleanup) = self.store.delete(&key, ACCOUNT_SERVICE) {
                warn!(target: "omni::account", %eoa, %cleanup, "failed to remove unlisted record");
            }
            return Err(err);
        }
        debug!(target: "omni::account", %eoa, "account saved");
        Ok(())
    }

    /// Loads the account of `eoa`.
    pub fn load(&self, eoa: Address) -> Result<CreatedAccount, AccountError> {
        let data = self.store.read(&store_account(&eoa), ACCOUNT_SERVICE)?;
        let account: CreatedAccount =
            serde_json::from_slice(&data).map_err(|_| CredentialStoreError::InvalidData)?;
        if account.eoa_address() != eoa {
            return Err(CredentialStoreError::InvalidData.into());
        }
        Ok(account)
    }

    /// Removes the account of `eoa`.
    pub fn delete(&self, eoa: Address) -> Result<(), AccountError> {
        self.store.delete(&store_account(&eoa), ACCOUNT_SERVICE)?;
        let mut index = self.list()?;
        index.retain(|entry| *entry != eoa);
        self.write_index(&index)?;
        debug!(target: "omni::account", %eoa, "account deleted");
        Ok(())
    }

    /// EOAs of every stored account, in insertion order.
    pub fn list(&self) -> Result<Vec<Address>, AccountError> {
        match self.store.read(ACCOUNT_INDEX_ACCOUNT, ACCOUNT_INDEX_SERVICE) {
            Ok(data) => {
                Ok(serde_json::from_slice(&data).map_err(|_| CredentialStoreError::InvalidData)?)
            }
            Err(CredentialStoreError::DataNotFound) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn add_to_index(&self, eoa: Address) -> Result<(), AccountError> {
        let mut index = self.list()?;
        if !index.contains(&eoa) {
            index.push(eoa);
            self.write_index(&index)?;
        }
        Ok(())
    }

    fn write_index(&self, index: &[Address]) -> Result<(), AccountError> {
        let data = serde_json::to_vec(index).map_err(|_| CredentialStoreError::InvalidData)?;
        self.store.save(&data, ACCOUNT_INDEX_ACCOUNT, ACCOUNT_INDEX_SERVICE)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{eoa_signing_key, PasskeyFixture},
        MemoryCredentialStore,
    };
    use alloy_primitives::address;

    const DELEGATE: Address = address!("63c0c19a282a1b52b07dd5a65b58948a07dae32b");

    fn account(seed: u8) -> CreatedAccount {
        let key = eoa_signing_key(seed);
        let authorization = build_authorization(1, DELEGATE, 0, &key).unwrap();
        CreatedAccount::new(
            key.address(),
            PasskeyFixture::new("omni.app").public_key("alice"),
            authorization,
        )
        .unwrap()
    }

    #[test]
    fn test_created_account_rejects_foreign_authorization() {
        let authorization = build_authorization(1, DELEGATE, 0, &eoa_signing_key(1)).unwrap();
        let other = eoa_signing_key(2).address();
        let err = CreatedAccount::new(
            other,
            PasskeyFixture::new("omni.app").public_key("alice"),
            authorization,
        )
        .unwrap_err();
        assert!(matches!(err, AccountError::AuthorityMismatch { expected, .. } if expected == other));
    }

    #[test]
    fn test_created_account_rejects_zero_key() {
        let key = eoa_signing_key(1);
        let mut passkey = PasskeyFixture::new("omni.app").public_key("alice");
        passkey.x = Default::default();
        let err = CreatedAccount::new(
            key.address(),
            passkey,
            build_authorization(1, DELEGATE, 0, &key).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err, AccountError::Passkey(PasskeyError::MalformedCoseKey("zero coordinate")));
    }

    #[test]
    fn test_created_account_json_round_trip_revalidates() {
        let account = account(1);
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("eoaAddress").is_some());
        assert!(json.get("signedAuthorization").is_some());
        assert_eq!(serde_json::from_value::<CreatedAccount>(json.clone()).unwrap(), account);

        let mut forged = json;
        forged["eoaAddress"] = serde_json::json!(eoa_signing_key(2).address());
        assert!(serde_json::from_value::<CreatedAccount>(forged).is_err());
    }

    #[test]
    fn test_repository_enforces_unique_eoa() {
        let repository = AccountRepository::new(MemoryCredentialStore::default());
        let account = account(1);
        repository.save(&account).unwrap();
        assert_eq!(
            repository.save(&account),
            Err(AccountError::DuplicateAccount(account.eoa_address()))
        );
        assert_eq!(repository.list().unwrap(), vec![account.eoa_address()]);
    }

    /// Fails every save of the account index while `broken` is set.
    #[derive(Default)]
    struct BrokenIndexStore {
        inner: MemoryCredentialStore,
        broken: std::sync::atomic::AtomicBool,
    }

    impl CredentialStore for BrokenIndexStore {
        fn save(
            &self,
            data: &[u8],
            account: &str,
            service: &str,
        ) -> Result<(), CredentialStoreError> {
            if service == ACCOUNT_INDEX_SERVICE &&
                self.broken.load(std::sync::atomic::Ordering::Relaxed)
            {
                return Err(CredentialStoreError::UnexpectedStatus(-34018));
            }
            self.inner.save(data, account, service)
        }

        fn read(&self, account: &str, service: &str) -> Result<Vec<u8>, CredentialStoreError> {
            self.inner.read(account, service)
        }

        fn delete(&self, account: &str, service: &str) -> Result<(), CredentialStoreError> {
            self.inner.delete(account, service)
        }
    }

    #[test]
    fn test_repository_index_failure_leaves_no_record() {
        let store = BrokenIndexStore::default();
        store.broken.store(true, std::sync::atomic::Ordering::Relaxed);
        let repository = AccountRepository::new(&store);
        let account = account(1);

        assert_eq!(
            repository.save(&account),
            Err(AccountError::Store(CredentialStoreError::UnexpectedStatus(-34018)))
        );
        assert_eq!(
            repository.load(account.eoa_address()),
            Err(AccountError::Store(CredentialStoreError::DataNotFound))
        );
        assert!(repository.list().unwrap().is_empty());

        store.broken.store(false, std::sync::atomic::Ordering::Relaxed);
        repository.save(&account).unwrap();
        assert_eq!(repository.list().unwrap(), vec![account.eoa_address()]);
        assert_eq!(repository.load(account.eoa_address()).unwrap(), account);
    }

    #[test]
    fn test_repository_load_list_delete() {
        let repository = AccountRepository::new(MemoryCredentialStore::default());
        let first = account(1);
        let second = account(2);
        repository.save(&first).unwrap();
        repository.save(&second).unwrap();

        assert_eq!(repository.load(second.eoa_address()).unwrap(), second);
        assert_eq!(repository.list().unwrap(), vec![first.eoa_address(), second.eoa_address()]);

        repository.delete(first.eoa_address()).unwrap();
        assert_eq!(repository.list().unwrap(), vec![second.eoa_address()]);
        assert_eq!(
            repository.load(first.eoa_address()),
            Err(AccountError::Store(CredentialStoreError::DataNotFound))
        );
    }

    #[test]
    fn test_repository_rejects_corrupt_record() {
        let store = MemoryCredentialStore::default();
        let eoa = eoa_signing_key(1).address();
        store.save(b"{not json", &store_account(&eoa), ACCOUNT_SERVICE).unwrap();
        assert_eq!(
            AccountRepository::new(&store).load(eoa),
            Err(AccountError::Store(CredentialStoreError::InvalidData))
        );
    }
}
