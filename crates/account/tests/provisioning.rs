//! End-to-end provisioning: passkey registration, delegation and persistence.

use alloy_primitives::{address, Address};
use omni_account::{
    constants::store::EOA_KEY_SERVICE,
    provision_account, store_account,
    test_utils::{eoa_signing_key, PasskeyFixture},
    AccountError, AccountRepository, AuthorizationError, AuthorizationSigned, AuthorizationSigner,
    CredentialSigner, CredentialStore, MemoryCredentialStore, PasskeyError, PasskeyVerifier,
};

const RP_ID: &str = "omni.app";
const DELEGATE: Address = address!("63c0c19a282a1b52b07dd5a65b58948a07dae32b");

#[test]
fn test_provision_persist_and_sign_in() {
    let store = MemoryCredentialStore::default();
    let signer = CredentialSigner::import(&store, &eoa_signing_key(1)).unwrap();
    let fixture = PasskeyFixture::new(RP_ID);

    let account =
        provision_account(&fixture.provisioning_request("alice", 10, DELEGATE, 0), &signer).unwrap();
    assert_eq!(account.eoa_address(), signer.address());
    assert_eq!(account.passkey().user_name, "alice");

    let authorization = account.signed_authorization();
    assert_eq!(authorization.chain_id, 10);
    assert_eq!(authorization.delegate_address, DELEGATE);
    let decoded = AuthorizationSigned::decode_wire(&authorization.encode_wire()).unwrap();
    assert_eq!(decoded.recover_authority().unwrap(), account.eoa_address());

    let repository = AccountRepository::new(&store);
    repository.save(&account).unwrap();
    let loaded = repository.load(account.eoa_address()).unwrap();
    assert_eq!(loaded, account);

    let response = fixture.assertion(b"session-1", 1, true);
    let outcome = PasskeyVerifier::new(RP_ID)
        .verify_assertion(&response, loaded.passkey(), b"session-1")
        .unwrap();
    assert_eq!(outcome.sign_count, 1);
}

#[test]
fn test_provision_rejects_wrong_relying_party() {
    let fixture = PasskeyFixture::new("evil.app");
    let mut request = fixture.provisioning_request("alice", 10, DELEGATE, 0);
    request.relying_party = RP_ID.to_string();

    assert!(matches!(
        provision_account(&request, &eoa_signing_key(1)),
        Err(AccountError::Passkey(PasskeyError::RelyingPartyMismatch { .. }))
    ));
}

#[test]
fn test_provision_rejects_chain_zero() {
    let request = PasskeyFixture::new(RP_ID).provisioning_request("alice", 0, DELEGATE, 0);
    assert_eq!(
        provision_account(&request, &eoa_signing_key(1)),
        Err(AccountError::Authorization(AuthorizationError::InvalidChainId))
    );
}

#[test]
fn test_provision_surfaces_custody_failure() {
    let store = MemoryCredentialStore::default();
    let signer = CredentialSigner::import(&store, &eoa_signing_key(3)).unwrap();
    store.delete(&store_account(&signer.address()), EOA_KEY_SERVICE).unwrap();

    let request = PasskeyFixture::new(RP_ID).provisioning_request("alice", 1, DELEGATE, 0);
    assert!(matches!(
        provision_account(&request, &signer),
        Err(AccountError::Authorization(AuthorizationError::AuthorizationFailed { code: 1, .. }))
    ));
}
