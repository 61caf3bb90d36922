// Provider configuration and client construction

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::openai::OPENAI_API_BASE;

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for OpenAI API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// OpenAI secret keys start with `sk-`; anything else is probably a paste error.
    pub fn has_valid_key_format(&self) -> bool {
        self.api_key.starts_with("sk-")
    }

    pub fn endpoint(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE)
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: &OpenAIConfig) -> Result<Arc<dyn crate::traits::ChatClient>> {
        if config.is_configured() && !config.has_valid_key_format() {
            tracing::warn!("API key format may be invalid - should start with 'sk-'");
        }

        let client = crate::openai::OpenAIClient::with_base_url(
            config.api_key.clone(),
            config.endpoint(),
        )?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_config_defaults_to_public_endpoint() {
        let config = OpenAIConfig::new("sk-test");
        assert_eq!(config.endpoint(), "https://api.openai.com/v1");
        assert!(config.is_configured());
        assert!(config.has_valid_key_format());
    }

    #[test]
    fn test_key_format_check() {
        assert!(!OpenAIConfig::new("test-key").has_valid_key_format());
        assert!(!OpenAIConfig::new("").is_configured());
    }

    #[test]
    fn test_factory_honours_base_url() {
        let config = OpenAIConfig::new("sk-test").with_base_url("http://localhost:9999/v1");
        assert_eq!(config.endpoint(), "http://localhost:9999/v1");
        assert!(ClientFactory::create_chat_client(&config).is_ok());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = OpenAIConfig::new("sk-test").with_base_url("http://proxy/v1");
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: OpenAIConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.endpoint(), "http://proxy/v1");
    }
}
