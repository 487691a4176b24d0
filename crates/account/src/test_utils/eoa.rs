use k256::ecdsa::SigningKey;

/// A secp256k1 key whose secret scalar is `seed`. Seed `1` controls
/// `0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf`.
///
/// # Panics
///
/// Panics if `seed` is zero.
pub fn eoa_signing_key(seed: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed;
    SigningKey::from_slice(&bytes).expect("non-zero scalar")
}
