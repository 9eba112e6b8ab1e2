//! Provider ID type and parsing utilities.

use std::fmt;
use std::str::FromStr;

/// Supported model providers, in default failover priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenRouter,
    GoogleAi,
    Cerebras,
}

impl ProviderId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "openrouter",
            ProviderId::GoogleAi => "google_ai",
            ProviderId::Cerebras => "cerebras",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::OpenRouter,
            ProviderId::GoogleAi,
            ProviderId::Cerebras,
        ]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openrouter" => Ok(ProviderId::OpenRouter),
            "google_ai" | "google" | "gemini" => Ok(ProviderId::GoogleAi),
            "cerebras" => Ok(ProviderId::Cerebras),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

impl serde::Serialize for ProviderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProviderId::from_str(&s).map_err(serde::de::Error::custom)
    }
}
