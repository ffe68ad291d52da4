//! Authenticated encryption of text at rest.
//!
//! This module is intentionally free of storage and HTTP dependencies. It
//! provides the seal/open operations used by the message pipeline and the
//! credential store.
//!
//! # Envelope format
//!
//! ```text
//! <hex(iv, 16 bytes)>:<hex(ciphertext)>:<hex(tag, 16 bytes)>
//! ```
//!
//! Storage and transport layers treat the envelope as an opaque string.

pub mod cipher;
pub mod envelope;
pub mod key;

pub use cipher::{CipherError, EnvelopeCipher};
pub use key::SecretKey;
