//! Authorization error type.

/// Errors raised while building, decoding or checking an authorization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    /// Chain id `0` cannot scope a delegation to a single chain.
    #[error("invalid chain id 0")]
    InvalidChainId,
    /// Delegating to the zero address would clear the account code.
    #[error("delegate address is zero")]
    ZeroDelegate,
    /// The signing capability of the account failed.
    #[error("authorization failed ({code}): {}", .message.as_deref().unwrap_or("no message"))]
    AuthorizationFailed {
        /// Error code reported by the signer
        code: i64,
        /// Human readable message, when available
        message: Option<String>,
    },
    /// The signature components violate the secp256k1 bounds.
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),
    /// The signer could not be recovered from the signature.
    #[error("failed to recover authority")]
    RecoveryFailed,
    /// The wire bytes are not a well-formed authorization tuple.
    #[error("malformed authorization encoding: {0}")]
    MalformedEncoding(alloy_rlp::Error),
}

impl From<alloy_rlp::Error> for AuthorizationError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::MalformedEncoding(err)
    }
}
