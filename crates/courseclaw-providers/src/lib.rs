//! # CourseClaw Providers
//!
//! Every supported backend speaks the OpenAI wire format, so a single
//! `OpenAiCompatibleProvider` serves both the chat capability and the
//! embedding capability. Backends differ only by endpoint, auth style and key.

pub mod openai_compatible;
pub mod provider_registry;

use courseclaw_core::config::CourseClawConfig;
use courseclaw_core::error::{CourseClawError, Result};

pub use openai_compatible::OpenAiCompatibleProvider;

/// Create a provider from configuration.
///
/// Fails with `ApiKeyMissing` when the selected backend needs a key and none
/// was configured or found in the environment.
pub fn create_provider(config: &CourseClawConfig) -> Result<OpenAiCompatibleProvider> {
    let provider_name = config.provider.as_str();

    let provider = match provider_name {
        // Custom endpoint: "custom:https://my-server.com/v1"
        other if other.starts_with("custom:") => {
            OpenAiCompatibleProvider::custom(other, config)
        }
        _ => {
            let registry = provider_registry::get_provider_config(provider_name)
                .ok_or_else(|| CourseClawError::ProviderNotFound(provider_name.into()))?;
            OpenAiCompatibleProvider::from_registry(registry, config)
        }
    };

    provider.require_credentials()?;
    tracing::debug!("Using provider '{}' at {}", provider_name, provider.base_url());
    Ok(provider)
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}
