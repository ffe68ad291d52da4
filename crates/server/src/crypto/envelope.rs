//! The `iv:ciphertext:authTag` envelope string format.

use std::{fmt, str::FromStr};

use super::cipher::CipherError;

/// Byte length of the per-seal random IV.
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Separator between the three hex fields.
pub const DELIMITER: char = ':';

/// A parsed envelope.
///
/// The string representation is `<hex(iv)>:<hex(ciphertext)>:<hex(tag)>` with
/// lowercase hex. `ciphertext` has the same length as the sealed plaintext,
/// so it is empty exactly when the plaintext was empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Random nonce drawn for this seal.
    pub iv: [u8; IV_LEN],
    /// Encrypted bytes, without the tag.
    pub ciphertext: Vec<u8>,
    /// Detached authentication tag.
    pub tag: [u8; TAG_LEN],
}

impl Envelope {
    /// Parse an envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] unless the input splits into
    /// exactly three hex fields with a 16-byte IV and a 16-byte tag.
    pub fn parse(s: &str) -> Result<Self, CipherError> {
        let parts: Vec<&str> = s.split(DELIMITER).collect();
        let [iv_hex, ciphertext_hex, tag_hex] = parts.as_slice() else {
            return Err(CipherError::InvalidFormat);
        };

        // decode_to_slice rejects any length other than the target size,
        // which also covers empty fields.
        let mut iv = [0u8; IV_LEN];
        hex::decode_to_slice(iv_hex, &mut iv).map_err(|_| CipherError::InvalidFormat)?;

        let mut tag = [0u8; TAG_LEN];
        hex::decode_to_slice(tag_hex, &mut tag).map_err(|_| CipherError::InvalidFormat)?;

        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CipherError::InvalidFormat)?;

        Ok(Self {
            iv,
            ciphertext,
            tag,
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            hex::encode(self.iv),
            hex::encode(&self.ciphertext),
            hex::encode(self.tag),
        )
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            iv: [0x11; IV_LEN],
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
            tag: [0x22; TAG_LEN],
        }
    }

    #[test]
    fn display_layout() {
        let s = sample().to_string();
        assert_eq!(
            s,
            format!("{}:deadbeef:{}", "11".repeat(IV_LEN), "22".repeat(TAG_LEN))
        );
    }

    #[test]
    fn parse_accepts_display_output() {
        let env = sample();
        assert_eq!(Envelope::parse(&env.to_string()).unwrap(), env);
    }

    #[test]
    fn parse_accepts_empty_ciphertext() {
        let s = format!("{}::{}", "00".repeat(IV_LEN), "00".repeat(TAG_LEN));
        let env: Envelope = s.parse().unwrap();
        assert!(env.ciphertext.is_empty());
    }

    #[test]
    fn parse_rejects_too_few_parts() {
        let s = format!("{}:{}", "00".repeat(IV_LEN), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&s), Err(CipherError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_too_many_parts() {
        let s = format!("{}:aa:bb:{}", "00".repeat(IV_LEN), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&s), Err(CipherError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_non_hex_segments() {
        let s = format!("{}:zz:{}", "00".repeat(IV_LEN), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&s), Err(CipherError::InvalidFormat));
        let s = format!("{}:aa:{}", "g0".repeat(IV_LEN), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&s), Err(CipherError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_odd_length_ciphertext() {
        let s = format!("{}:abc:{}", "00".repeat(IV_LEN), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&s), Err(CipherError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_wrong_iv_and_tag_lengths() {
        let short_iv = format!("{}:aa:{}", "00".repeat(12), "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&short_iv), Err(CipherError::InvalidFormat));
        let long_tag = format!("{}:aa:{}", "00".repeat(IV_LEN), "00".repeat(17));
        assert_eq!(Envelope::parse(&long_tag), Err(CipherError::InvalidFormat));
        let empty_iv = format!(":aa:{}", "00".repeat(TAG_LEN));
        assert_eq!(Envelope::parse(&empty_iv), Err(CipherError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert_eq!(Envelope::parse("hello world"), Err(CipherError::InvalidFormat));
        assert_eq!(Envelope::parse(""), Err(CipherError::InvalidFormat));
    }
}
