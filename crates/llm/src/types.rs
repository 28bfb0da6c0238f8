//! Provider identification.

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    Gemini,
    HuggingFace,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "gemini" | "google" => Some(Self::Gemini),
            "huggingface" | "hf" => Some(Self::HuggingFace),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "gemma3:1b",
            Self::Gemini => "gemini-1.5-flash",
            Self::HuggingFace => "Qwen/Qwen2.5-72B-Instruct",
        }
    }

    /// Environment variable the provider reads its credential from.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::Gemini => Some("GEMINI_KEY"),
            Self::HuggingFace => Some("HF_TOKEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("Gemini"), Some(ProviderType::Gemini));
        assert_eq!(ProviderType::parse("hf"), Some(ProviderType::HuggingFace));
        assert_eq!(ProviderType::parse("unknown"), None);
    }

    #[test]
    fn test_credentials() {
        assert_eq!(ProviderType::Ollama.credential_env(), None);
        assert_eq!(ProviderType::Gemini.credential_env(), Some("GEMINI_KEY"));
        assert_eq!(ProviderType::HuggingFace.credential_env(), Some("HF_TOKEN"));
    }

    #[test]
    fn test_round_trip_names() {
        for p in [
            ProviderType::Ollama,
            ProviderType::Gemini,
            ProviderType::HuggingFace,
        ] {
            assert_eq!(ProviderType::parse(p.as_str()), Some(p));
        }
    }
}
