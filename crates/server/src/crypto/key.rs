//! [`SecretKey`]: the process-wide AES-256 key decoded from configuration.

use thiserror::Error;
use zeroize::Zeroize;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Length of the hex-encoded key as supplied in configuration.
pub const KEY_HEX_LEN: usize = KEY_LEN * 2;

/// Errors produced while decoding the configured key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// No key material was supplied.
    #[error("ENCRYPTION_KEY is required and must not be empty")]
    Missing,

    /// The hex string is not exactly [`KEY_HEX_LEN`] characters.
    #[error("ENCRYPTION_KEY must be a 64-character hex string, got {0} characters")]
    InvalidHexLength(usize),

    /// The hex string contains non-hex characters.
    #[error("ENCRYPTION_KEY is not valid hex")]
    InvalidHex,

    /// The raw key material has the wrong length.
    #[error("encryption key has invalid length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Constructed once at startup and moved into the cipher. Not `Clone`; the
/// memory is overwritten with zeroes on drop.
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// Decode a key from its configured hex representation.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Missing`] for an empty string,
    /// [`KeyError::InvalidHexLength`] unless the string is [`KEY_HEX_LEN`]
    /// characters, and [`KeyError::InvalidHex`] for non-hex input.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        if encoded.is_empty() {
            return Err(KeyError::Missing);
        }
        if encoded.len() != KEY_HEX_LEN {
            return Err(KeyError::InvalidHexLength(encoded.len()));
        }
        let mut raw = hex::decode(encoded).map_err(|_| KeyError::InvalidHex)?;
        let key = Self::from_bytes(&raw);
        raw.zeroize();
        key
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if `bytes` is not [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("SecretKey([REDACTED])")
    }
}
