//! CBOR decoding of attestation objects and COSE credential keys.

use alloy_primitives::{Bytes, B256};
use ciborium::Value;

use crate::constants::cose;

use super::PasskeyError;

/// The decoded top-level attestation object: `{ fmt, attStmt, authData }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationObject {
    /// Attestation statement format identifier.
    pub fmt: String,
    /// Raw authenticator data.
    pub auth_data: Bytes,
}

impl AttestationObject {
    /// Decodes the attestation object. The attestation statement is required to be a map but its
    /// contents are not interpreted.
    pub fn decode(bytes: &[u8]) -> Result<Self, PasskeyError> {
        let mut reader = bytes;
        let value: Value = ciborium::de::from_reader(&mut reader)
            .map_err(|_| PasskeyError::MalformedAttestationObject("invalid CBOR"))?;
        if !reader.is_empty() {
            return Err(PasskeyError::MalformedAttestationObject("trailing bytes"));
        }
        let Value::Map(entries) = value else {
            return Err(PasskeyError::MalformedAttestationObject("not a map"));
        };

        let fmt = match text_entry(&entries, "fmt") {
            Some(Value::Text(fmt)) => fmt.clone(),
            _ => return Err(PasskeyError::MalformedAttestationObject("missing fmt")),
        };
        if !matches!(text_entry(&entries, "attStmt"), Some(Value::Map(_))) {
            return Err(PasskeyError::MalformedAttestationObject("missing attStmt"));
        }
        let auth_data = match text_entry(&entries, "authData") {
            Some(Value::Bytes(data)) => Bytes::copy_from_slice(data),
            _ => return Err(PasskeyError::MalformedAttestationObject("missing authData")),
        };

        Ok(Self { fmt, auth_data })
    }
}

/// An ES256 credential public key decoded from its COSE encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoseKey {
    /// The x coordinate.
    pub x: B256,
    /// The y coordinate.
    pub y: B256,
}

impl CoseKey {
    /// Decodes one COSE key from the front of `reader`, advancing it past the consumed bytes.
    ///
    /// Only `kty = EC2`, `alg = ES256` and `crv = P-256` are accepted, and the coordinates must
    /// describe a point on the curve.
    pub fn decode(reader: &mut &[u8]) -> Result<Self, PasskeyError> {
        let value: Value = ciborium::de::from_reader(&mut *reader)
            .map_err(|_| PasskeyError::MalformedCoseKey("invalid CBOR"))?;
        let Value::Map(entries) = value else {
            return Err(PasskeyError::MalformedCoseKey("not a map"));
        };

        if int_param(&entries, cose::LABEL_KEY_TYPE) != Some(cose::KEY_TYPE_EC2) {
            return Err(PasskeyError::MalformedCoseKey("key type is not EC2"));
        }
        if int_param(&entries, cose::LABEL_ALGORITHM) != Some(cose::ALGORITHM_ES256) {
            return Err(PasskeyError::MalformedCoseKey("algorithm is not ES256"));
        }
        if int_param(&entries, cose::LABEL_CURVE) != Some(cose::CURVE_P256) {
            return Err(PasskeyError::MalformedCoseKey("curve is not P-256"));
        }
        let x = coordinate(&entries, cose::LABEL_X)?;
        let y = coordinate(&entries, cose::LABEL_Y)?;

        let key = Self { x, y };
        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..33].copy_from_slice(x.as_slice());
        sec1[33..].copy_from_slice(y.as_slice());
        p256::PublicKey::from_sec1_bytes(&sec1)
            .map_err(|_| PasskeyError::MalformedCoseKey("point is not on P-256"))?;
        Ok(key)
    }
}

fn text_entry<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| matches!(k, Value::Text(text) if text == key)).map(|(_, v)| v)
}

fn label_entry(entries: &[(Value, Value)], label: i128) -> Option<&Value> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Integer(int) if i128::from(*int) == label))
        .map(|(_, v)| v)
}

fn int_param(entries: &[(Value, Value)], label: i128) -> Option<i128> {
    match label_entry(entries, label)? {
        Value::Integer(int) => Some(i128::from(*int)),
        _ => None,
    }
}

fn coordinate(entries: &[(Value, Value)], label: i128) -> Result<B256, PasskeyError> {
    match label_entry(entries, label) {
        Some(Value::Bytes(bytes)) if bytes.len() == cose::COORDINATE_LEN => {
            let coordinate = B256::from_slice(bytes);
            if coordinate.is_zero() {
                return Err(PasskeyError::MalformedCoseKey("zero coordinate"));
            }
            Ok(coordinate)
        }
        Some(Value::Bytes(_)) => Err(PasskeyError::MalformedCoseKey("coordinate is not 32 bytes")),
        _ => Err(PasskeyError::MalformedCoseKey("missing coordinate")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(value, &mut out).unwrap();
        out
    }

    fn cose_map(kty: i64, alg: i64, crv: i64, x: Vec<u8>, y: Vec<u8>) -> Value {
        Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(kty.into())),
            (Value::Integer(3.into()), Value::Integer(alg.into())),
            (Value::Integer((-1).into()), Value::Integer(crv.into())),
            (Value::Integer((-2).into()), Value::Bytes(x)),
            (Value::Integer((-3).into()), Value::Bytes(y)),
        ])
    }

    #[test]
    fn test_attestation_object_rejects_non_map() {
        let bytes = encode(&Value::Array(vec![]));
        assert_eq!(
            AttestationObject::decode(&bytes),
            Err(PasskeyError::MalformedAttestationObject("not a map"))
        );
    }

    #[test]
    fn test_attestation_object_requires_auth_data_bytes() {
        let bytes = encode(&Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (Value::Text("authData".into()), Value::Text("not bytes".into())),
        ]));
        assert_eq!(
            AttestationObject::decode(&bytes),
            Err(PasskeyError::MalformedAttestationObject("missing authData"))
        );
    }

    #[test]
    fn test_attestation_object_rejects_garbage() {
        assert_eq!(
            AttestationObject::decode(&[0xff, 0x00, 0x13]),
            Err(PasskeyError::MalformedAttestationObject("invalid CBOR"))
        );
    }

    #[test]
    fn test_cose_key_rejects_wrong_algorithm() {
        let bytes = encode(&cose_map(2, -8, 1, vec![1; 32], vec![2; 32]));
        assert_eq!(
            CoseKey::decode(&mut bytes.as_slice()),
            Err(PasskeyError::MalformedCoseKey("algorithm is not ES256"))
        );
    }

    #[test]
    fn test_cose_key_rejects_short_coordinate() {
        let bytes = encode(&cose_map(2, -7, 1, vec![1; 31], vec![2; 32]));
        assert_eq!(
            CoseKey::decode(&mut bytes.as_slice()),
            Err(PasskeyError::MalformedCoseKey("coordinate is not 32 bytes"))
        );
    }

    #[test]
    fn test_cose_key_rejects_point_off_curve() {
        let bytes = encode(&cose_map(2, -7, 1, vec![1; 32], vec![2; 32]));
        assert_eq!(
            CoseKey::decode(&mut bytes.as_slice()),
            Err(PasskeyError::MalformedCoseKey("point is not on P-256"))
        );
    }

    #[test]
    fn test_cose_key_advances_reader() {
        use p256::{ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint};

        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let point = signing_key.verifying_key().as_affine().to_encoded_point(false);
        let mut bytes = encode(&cose_map(
            2,
            -7,
            1,
            point.x().unwrap().to_vec(),
            point.y().unwrap().to_vec(),
        ));
        bytes.extend_from_slice(&[0xa0]);

        let mut reader = bytes.as_slice();
        let key = CoseKey::decode(&mut reader).unwrap();
        assert_eq!(key.x.as_slice(), point.x().unwrap().as_slice());
        assert_eq!(reader, &[0xa0]);
    }
}
