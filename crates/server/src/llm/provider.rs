//! Known LLM providers and their identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An LLM vendor a user can hold an API key for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
    Cohere,
}

/// Returned when a provider identifier is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl Provider {
    /// Every supported provider, in display order.
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Cohere];

    /// Stable identifier used on the wire and in storage.
    pub fn id(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Cohere => "cohere",
        }
    }

    /// Human-readable name shown in replies.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI (GPT)",
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::Cohere => "Cohere",
        }
    }

    /// Model requested when the caller does not name one.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Anthropic => "claude-2.1",
            Provider::Cohere => "command-r",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| UnknownProvider(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_str() {
        for p in Provider::ALL {
            assert_eq!(p.id().parse::<Provider>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_id_rejected() {
        assert_eq!(
            "mistral".parse::<Provider>(),
            Err(UnknownProvider("mistral".into()))
        );
        assert!("OpenAI".parse::<Provider>().is_err());
    }

    #[test]
    fn serde_uses_ids() {
        assert_eq!(
            serde_json::to_value(Provider::OpenAi).unwrap(),
            serde_json::json!("openai")
        );
    }

    #[test]
    fn default_is_openai() {
        assert_eq!(Provider::default(), Provider::OpenAi);
    }
}
