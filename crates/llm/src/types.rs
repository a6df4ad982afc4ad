//! Provider identity types.

use std::fmt;

/// The chat-completion backends Veriqa can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    OpenAI,
    Together,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "together" | "together.ai" | "togetherai" => Some(Self::Together),
            _ => None,
        }
    }

    /// Canonical provider key, as used in config and response bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Together => "together",
        }
    }

    /// Human-facing name, used in error sentinels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Together => "Together.ai",
        }
    }

    /// Default API base URL.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Together => "https://api.together.xyz/v1",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("OpenAI"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("together"), Some(ProviderType::Together));
        assert_eq!(ProviderType::parse("together.ai"), Some(ProviderType::Together));
        assert_eq!(ProviderType::parse("ollama"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(ProviderType::Together.as_str(), "together");
        assert_eq!(ProviderType::Together.display_name(), "Together.ai");
        assert_eq!(ProviderType::OpenAI.to_string(), "openai");
    }
}
