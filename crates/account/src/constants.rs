//! Constants for passkey verification and EIP-7702 delegation.
//!
//! It groups the constants by the protocol they belong to as sub-modules.

/// Constants of the WebAuthn ceremonies.
pub mod webauthn {
    /// `clientDataJSON.type` of a registration ceremony.
    pub const CLIENT_DATA_TYPE_CREATE: &str = "webauthn.create";
    /// `clientDataJSON.type` of an authentication ceremony.
    pub const CLIENT_DATA_TYPE_GET: &str = "webauthn.get";

    /// Authenticator data flag: user present (UP).
    pub const FLAG_USER_PRESENT: u8 = 0x01;
    /// Authenticator data flag: user verified (UV).
    pub const FLAG_USER_VERIFIED: u8 = 0x04;
    /// Authenticator data flag: attested credential data included (AT).
    pub const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    /// Authenticator data flag: extension data included (ED).
    pub const FLAG_EXTENSION_DATA: u8 = 0x80;

    /// Length of the fixed authenticator data header: `rpIdHash (32) || flags (1) || signCount
    /// (4)`.
    pub const AUTH_DATA_HEADER_LEN: usize = 37;
    /// Length of the authenticator attestation GUID.
    pub const AAGUID_LEN: usize = 16;

    /// Attestation statement formats registered with IANA. Anything else is rejected as an
    /// unsupported response.
    pub const ATTESTATION_FORMATS: &[&str] =
        &["none", "packed", "apple", "android-key", "android-safetynet", "tpm", "fido-u2f"];
}

/// COSE key labels and values for ES256 credentials.
pub mod cose {
    /// Label of the key type parameter.
    pub const LABEL_KEY_TYPE: i128 = 1;
    /// Label of the algorithm parameter.
    pub const LABEL_ALGORITHM: i128 = 3;
    /// Label of the curve parameter.
    pub const LABEL_CURVE: i128 = -1;
    /// Label of the x coordinate.
    pub const LABEL_X: i128 = -2;
    /// Label of the y coordinate.
    pub const LABEL_Y: i128 = -3;

    /// Key type `EC2`.
    pub const KEY_TYPE_EC2: i128 = 2;
    /// Algorithm `ES256` (ECDSA with SHA-256).
    pub const ALGORITHM_ES256: i128 = -7;
    /// Curve `P-256`.
    pub const CURVE_P256: i128 = 1;

    /// Length of an uncompressed P-256 coordinate.
    pub const COORDINATE_LEN: usize = 32;
}

/// Constants of EIP-7702 set-code delegations.
pub mod eip7702 {
    use alloy_primitives::{uint, U256};

    /// Domain separator prepended to the RLP encoded authorization before hashing.
    pub const MAGIC: u8 = 0x05;

    /// Order of the secp256k1 curve. Signature scalars must be strictly below it.
    pub const SECP256K1N: U256 =
        uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

    /// Half the secp256k1 order. Accepted `s` scalars are at most this value (EIP-2).
    pub const SECP256K1N_HALF: U256 =
        uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);
}

/// Keys under which accounts are kept in the credential store.
pub mod store {
    /// Service name of persisted [`CreatedAccount`](crate::CreatedAccount) records.
    pub const ACCOUNT_SERVICE: &str = "omni.account";
    /// Service name of the record listing every persisted account.
    pub const ACCOUNT_INDEX_SERVICE: &str = "omni.account.index";
    /// Account name of the index record.
    pub const ACCOUNT_INDEX_ACCOUNT: &str = "index";
    /// Service name of raw EOA signing keys.
    pub const EOA_KEY_SERVICE: &str = "omni.eoa-key";
}
