//! Error types for passkey ceremonies.

/// Errors raised while verifying a passkey attestation or assertion.
///
/// Every variant is recoverable by running the ceremony again; the verifier holds no state that
/// a failure could corrupt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasskeyError {
    /// The authenticator returned a response this verifier does not handle (wrong ceremony type
    /// or an unknown attestation format).
    #[error("unsupported authenticator response: {0}")]
    UnsupportedResponse(String),
    /// The attestation object is not the expected CBOR map.
    #[error("malformed attestation object: {0}")]
    MalformedAttestationObject(&'static str),
    /// The authenticator data is truncated or inconsistent with its flags.
    #[error("malformed authenticator data: {0}")]
    MalformedAuthenticatorData(&'static str),
    /// The credential public key is not an ES256 P-256 COSE key.
    #[error("malformed COSE key: {0}")]
    MalformedCoseKey(&'static str),
    /// The client data is not valid JSON or misses required members.
    #[error("malformed clientDataJSON: {0}")]
    MalformedClientDataJson(String),
    /// The challenge signed by the authenticator is not the one that was issued.
    #[error("challenge mismatch")]
    ChallengeMismatch,
    /// The origin or RP ID hash does not belong to the expected relying party.
    #[error("relying party mismatch: expected {expected}, got {actual}")]
    RelyingPartyMismatch {
        /// The relying party identifier the verifier was configured with
        expected: String,
        /// The origin or RP ID hash presented by the authenticator
        actual: String,
    },
    /// The signature is neither DER nor fixed-width `r || s`.
    #[error("malformed signature")]
    MalformedSignature,
    /// The assertion was produced by a different credential than the stored one.
    #[error("credential id mismatch")]
    CredentialIdMismatch,
    /// User verification is required but the UV flag is not set.
    #[error("user verification required")]
    UserVerificationRequired,
    /// The ECDSA signature does not verify against the stored public key.
    #[error("signature verification failed")]
    SignatureVerificationFailed,
    /// An error surfaced by the presentation layer, passed through unchanged.
    #[error(transparent)]
    Presentation(#[from] PresentationError),
}

/// Errors owned by the presentation collaborator that drives the platform passkey prompt.
///
/// The verifier never produces these; they are declared here so callers can propagate them
/// through the same error channel without reinterpretation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    /// No window was available to anchor the platform prompt.
    #[error("missing window anchor")]
    MissingWindowAnchor,
    /// The platform authorization controller failed.
    #[error("authorization failed ({code}): {}", .message.as_deref().unwrap_or("no message"))]
    AuthorizationFailed {
        /// Platform error code
        code: i64,
        /// Human readable message, when the platform provides one
        message: Option<String>,
    },
}
