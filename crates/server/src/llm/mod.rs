//! LLM providers and the completion capability used to produce replies.
//!
//! Each provider maps to one [`CompletionClient`] through [`CompletionRegistry`].
//! Only the offline client ships in this crate; vendor SDK clients plug in
//! through the same trait.

pub mod completion;
pub mod provider;

pub use completion::{CompletionRegistry, CompletionRequest};
pub use provider::Provider;
