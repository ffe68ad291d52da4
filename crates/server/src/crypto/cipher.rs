//! AES-256-GCM sealing and opening of individual string values.
//!
//! **Algorithm choice:** AES-256-GCM with a 128-bit random IV per seal and a
//! detached 128-bit tag. The 16-byte IV is wider than the 12 bytes GCM is
//! usually run with; GHASH derives the initial counter from it, so stored
//! envelopes stay readable. Never derive the IV from a counter or reuse one
//! under the same key.

use std::sync::Arc;

use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use thiserror::Error;

use super::envelope::{Envelope, IV_LEN, TAG_LEN};
use super::key::SecretKey;

/// AES-256-GCM instantiated with a 16-byte nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length for AES-256.
    #[error("invalid key length")]
    InvalidKeyLength,

    /// The value is not a well-formed envelope.
    #[error("invalid envelope format")]
    InvalidFormat,

    /// Tag verification failed: tampered data, wrong key, or corruption.
    #[error("envelope authentication failed")]
    Authentication,

    /// The RNG or the AEAD primitive failed while sealing.
    #[error("encryption failed")]
    EncryptionFailure,
}

/// Seals and opens envelopes under the process key.
///
/// Cheap to clone; all clones share the same expanded key. Holds no mutable
/// state, so concurrent seal and open calls need no coordination.
#[derive(Clone)]
pub struct EnvelopeCipher {
    aead: Arc<Aes256Gcm16>,
}

impl EnvelopeCipher {
    /// Build a cipher from the process key. The key is consumed and zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if the AEAD rejects the key
    /// (unreachable for a validated [`SecretKey`]).
    pub fn new(key: SecretKey) -> Result<Self, CipherError> {
        let aead = Aes256Gcm16::new_from_slice(key.as_bytes())
            .map_err(|_| CipherError::InvalidKeyLength)?;
        Ok(Self {
            aead: Arc::new(aead),
        })
    }

    /// Encrypt `plaintext` and return the envelope string.
    ///
    /// A fresh IV is drawn from the OS CSPRNG on every call.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EncryptionFailure`] if the RNG or the AEAD fails.
    pub fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        self.seal_envelope(plaintext).map(|env| env.to_string())
    }

    /// Encrypt `plaintext` into a structured [`Envelope`].
    pub fn seal_envelope(&self, plaintext: &str) -> Result<Envelope, CipherError> {
        let mut iv = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|_| CipherError::EncryptionFailure)?;

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .aead
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CipherError::EncryptionFailure)?;

        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(&tag);

        Ok(Envelope {
            iv,
            ciphertext: buffer,
            tag: tag_bytes,
        })
    }

    /// Decrypt an envelope string back to its plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] if the input is not an envelope
    /// or does not decrypt to UTF-8, and [`CipherError::Authentication`] if
    /// the tag does not verify. No plaintext is returned on failure.
    pub fn open(&self, envelope: &str) -> Result<String, CipherError> {
        let parsed = Envelope::parse(envelope)?;
        self.open_envelope(&parsed)
    }

    /// Decrypt an already-parsed [`Envelope`].
    pub fn open_envelope(&self, envelope: &Envelope) -> Result<String, CipherError> {
        let mut buffer = envelope.ciphertext.clone();
        self.aead
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&envelope.iv),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(&envelope.tag),
            )
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(buffer).map_err(|_| CipherError::InvalidFormat)
    }
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvelopeCipher([REDACTED])")
    }
}
