//! LLM provider factory.
//!
//! Creates chat clients from a provider name, resolving endpoint overrides
//! and requiring the secrets each backend needs.

use crate::client::LlmClient;
use crate::providers::{OpenAiClient, TogetherClient};
use crate::types::ProviderType;
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "together")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key; both backends require one
///
/// # Errors
/// Returns a message if the provider is unknown or its API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        format!(
            "{} provider requires API key",
            provider_type.display_name()
        )
    })?;

    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::OpenAI => Ok(Arc::new(OpenAiClient::with_base_url(base_url, api_key))),
        ProviderType::Together => Ok(Arc::new(TogetherClient::with_base_url(base_url, api_key))),
    }
}

/// Create an OpenAI client that also sends an organization header.
pub fn create_openai_client(
    endpoint: Option<&str>,
    api_key: Option<&str>,
    organization: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let Some(organization) = organization else {
        return create_client("openai", endpoint, api_key);
    };

    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| "OpenAI provider requires API key".to_string())?;
    let base_url = endpoint.unwrap_or(ProviderType::OpenAI.default_endpoint());

    Ok(Arc::new(
        OpenAiClient::with_base_url(base_url, api_key).with_organization(organization),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_client() {
        let client = create_client("openai", None, Some("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_create_together_with_custom_endpoint() {
        let client = create_client("together", Some("http://localhost:8080/v1"), Some("k"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None) {
            Err(err) => assert!(err.contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_together_rejects_blank_key() {
        match create_client("together", None, Some("  ")) {
            Err(err) => assert!(err.contains("Together.ai provider requires API key")),
            Ok(_) => panic!("Expected error for Together.ai with blank key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, Some("k")) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_openai_with_organization() {
        let client = create_openai_client(None, Some("sk"), Some("org-42")).unwrap();
        assert_eq!(client.provider_name(), "openai");
        assert!(create_openai_client(None, None, Some("org-42")).is_err());
    }
}
