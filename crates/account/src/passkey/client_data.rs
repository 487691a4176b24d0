//! Decoding and checking of `clientDataJSON`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

use super::PasskeyError;

/// The members of `clientDataJSON` this verifier inspects. Unknown members are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    /// Ceremony type, `webauthn.create` or `webauthn.get`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Base64url encoded challenge.
    pub challenge: String,
    /// Origin of the caller, e.g. `https://example.com`.
    pub origin: String,
    /// Whether the ceremony ran in a cross-origin iframe.
    #[serde(default)]
    pub cross_origin: bool,
}

impl ClientData {
    /// Parses the raw JSON bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, PasskeyError> {
        serde_json::from_slice(raw).map_err(|err| PasskeyError::MalformedClientDataJson(err.to_string()))
    }

    /// Checks the ceremony type, challenge and origin against the expected values.
    pub fn verify(
        &self,
        expected_type: &str,
        expected_challenge: &[u8],
        relying_party: &str,
    ) -> Result<(), PasskeyError> {
        if self.ty != expected_type {
            return Err(PasskeyError::UnsupportedResponse(format!(
                "client data type {:?}, expected {expected_type:?}",
                self.ty
            )));
        }

        let challenge = decode_challenge(&self.challenge)?;
        if challenge != expected_challenge {
            return Err(PasskeyError::ChallengeMismatch);
        }

        let host = origin_host(&self.origin).ok_or_else(|| {
            PasskeyError::MalformedClientDataJson(format!("invalid origin {:?}", self.origin))
        })?;
        if !host_matches(host, relying_party) {
            return Err(PasskeyError::RelyingPartyMismatch {
                expected: relying_party.to_string(),
                actual: self.origin.clone(),
            });
        }
        Ok(())
    }
}

/// Decodes a base64url challenge. Authenticators differ on padding, so trailing `=` is tolerated.
pub fn decode_challenge(encoded: &str) -> Result<Vec<u8>, PasskeyError> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|_| PasskeyError::MalformedClientDataJson("challenge is not base64url".to_string()))
}

/// Extracts the host from an `http(s)://host[:port][/path]` origin.
fn origin_host(origin: &str) -> Option<&str> {
    let rest = origin.strip_prefix("https://").or_else(|| origin.strip_prefix("http://"))?;
    let authority = rest.split('/').next()?;
    let host = authority.rsplit_once(':').map_or(authority, |(host, _)| host);
    (!host.is_empty()).then_some(host)
}

/// An origin matches the relying party when its host is the RP ID or one of its subdomains.
fn host_matches(host: &str, relying_party: &str) -> bool {
    host.eq_ignore_ascii_case(relying_party) ||
        host.len() > relying_party.len() + 1 &&
            host.as_bytes()[host.len() - relying_party.len() - 1] == b'.' &&
            host[host.len() - relying_party.len()..].eq_ignore_ascii_case(relying_party)
}
