//! Hex loading utilities for omni

use std::{fs, io::Read, path::Path};

use alloy_primitives::{hex, Bytes};

use super::{CliError, Result};

/// Load hex-encoded bytes from an argument or a file. If the file is a dash (-), read from stdin.
/// Priority: arg > file. Returns `None` if neither is provided.
pub fn load_hex(arg: Option<&str>, file: Option<&Path>) -> Result<Option<Bytes>> {
    let hex_string = if let Some(arg) = arg {
        arg.to_string()
    } else if let Some(file) = file {
        if file == Path::new("-") {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            fs::read_to_string(file)?
        }
    } else {
        return Ok(None);
    };

    decode_hex(&hex_string).map(|bytes| Some(Bytes::from(bytes)))
}

/// Like [`load_hex`], but the value is required.
pub fn require_hex(name: &str, arg: Option<&str>, file: Option<&Path>) -> Result<Bytes> {
    load_hex(arg, file)?.ok_or_else(|| CliError::InvalidInput(format!("missing --{name}")))
}

/// Interprets `value` as hex if it decodes as hex, otherwise as the path of a file holding hex.
pub fn hex_or_file(value: &str) -> Result<Bytes> {
    match decode_hex(value) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes.into()),
        _ => load_hex(None, Some(Path::new(value)))?
            .ok_or_else(|| CliError::InvalidInput(format!("no hex in {value}"))),
    }
}

/// Decode hex string, handling optional 0x prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();

    if s.is_empty() {
        return Ok(Vec::new());
    }

    let hex_str = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    if hex_str.len() % 2 != 0 {
        return Err(CliError::InvalidInput(format!(
            "Invalid hex string length: {} (must be even)",
            hex_str.len()
        )));
    }

    Ok(hex::decode(hex_str)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0xdeadbeef", vec![0xde, 0xad, 0xbe, 0xef])]
    #[case("0XDEADBEEF", vec![0xde, 0xad, 0xbe, 0xef])]
    #[case("  0102\n", vec![1, 2])]
    #[case("", vec![])]
    fn test_decode_hex(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(decode_hex(input).unwrap(), expected);
    }

    #[test]
    fn test_decode_hex_rejects_odd_length() {
        assert!(matches!(decode_hex("0x123"), Err(CliError::InvalidInput(_))));
        assert!(matches!(decode_hex("zz"), Err(CliError::InvalidHex(_))));
    }

    #[test]
    fn test_arg_takes_priority_over_file() {
        let loaded = load_hex(Some("0x01"), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(loaded, Some(Bytes::from(vec![1])));
        assert_eq!(load_hex(None, None).unwrap(), None);
    }

    #[test]
    fn test_hex_or_file_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0xabcd").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert_eq!(hex_or_file(&path).unwrap(), Bytes::from(vec![0xab, 0xcd]));
        assert_eq!(hex_or_file("abcd").unwrap(), Bytes::from(vec![0xab, 0xcd]));
    }
}
