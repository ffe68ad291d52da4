//! Common types, protocol definitions, and errors shared across `sealed-chat` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
