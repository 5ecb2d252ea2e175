//! EIP-2335 keystore document model and structural validation
//!
//! An EIP-2335 document encodes an encrypted BLS signing key. The launcher
//! only cares that the shape is right before it writes the document to
//! disk: required fields present, the uuid well-formed, the version sane,
//! and each crypto sub-module carrying a function and params. Semantic
//! crypto content is never inspected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One crypto sub-module of the keystore: `kdf`, `checksum` or `cipher`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CryptoModule {
    /// Function name, e.g. `scrypt` or `aes-128-ctr`
    pub function: String,
    /// Function-specific parameters (salt, N, r, p, iv, ...)
    pub params: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl CryptoModule {
    fn validate(&self, name: &str) -> Result<()> {
        if self.function.is_empty() {
            return Err(Error::MalformedKeystore(format!(
                "missing required field: {name}.function"
            )));
        }
        if self.params.is_none() {
            return Err(Error::MalformedKeystore(format!(
                "missing required field: {name}.params"
            )));
        }
        Ok(())
    }
}

/// The `crypto` object of the keystore.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Crypto {
    pub kdf: CryptoModule,
    pub checksum: CryptoModule,
    pub cipher: CryptoModule,
}

/// An EIP-2335 keystore document.
///
/// Required fields: `crypto`, `path`, `uuid`, `version`. Optional:
/// `description` and `pubkey`; the pubkey is surfaced in listings but
/// never validated. All fields deserialize leniently so that a missing
/// field is reported as a schema violation naming the field, not as a
/// parse failure.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Keystore {
    pub crypto: Crypto,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pubkey: String,
    pub path: String,
    pub uuid: String,
    pub version: i64,
}

impl Keystore {
    /// Parse and structurally validate an EIP-2335 document.
    ///
    /// Malformed JSON and schema violations are distinguished: the former
    /// is a [`Error::BadRequest`], the latter a [`Error::MalformedKeystore`]
    /// naming the offending field.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let keystore: Keystore = serde_json::from_slice(data)
            .map_err(|e| Error::BadRequest(format!("invalid JSON: {e}")))?;
        keystore.validate()?;
        Ok(keystore)
    }

    /// Structural checks only.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::MalformedKeystore(
                "missing required field: path".to_string(),
            ));
        }
        if self.uuid.is_empty() {
            return Err(Error::MalformedKeystore(
                "missing required field: uuid".to_string(),
            ));
        }
        if !is_uuid(&self.uuid) {
            return Err(Error::MalformedKeystore("invalid uuid format".to_string()));
        }
        if self.version < 1 {
            return Err(Error::MalformedKeystore(
                "invalid version: must be a number greater than or equal to 1".to_string(),
            ));
        }
        self.crypto.kdf.validate("crypto.kdf")?;
        self.crypto.checksum.validate("crypto.checksum")?;
        self.crypto.cipher.validate("crypto.cipher")?;
        Ok(())
    }
}

/// Lowercase-hex uuid shape: 8-4-4-4-12 groups.
fn is_uuid(s: &str) -> bool {
    let mut groups = s.split('-');
    for expected_len in [8usize, 4, 4, 4, 12] {
        match groups.next() {
            Some(group)
                if group.len() == expected_len
                    && group
                        .bytes()
                        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) => {}
            _ => return false,
        }
    }
    groups.next().is_none()
}
