//! Language-model capability.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, ProviderResponse, ToolDefinition};

/// Sampling parameters sent with every chat request.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Submit the full ordered history plus tool definitions (may be empty).
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse>;
}
