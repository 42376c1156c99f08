//! Unified OpenAI-compatible provider.
//!
//! One struct serves chat completions (with function tools) and embeddings
//! for every OpenAI-compatible API. Providers are distinguished only by
//! endpoint URL, auth style, and API key.

use async_trait::async_trait;
use courseclaw_core::config::CourseClawConfig;
use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::embedder::Embedder;
use courseclaw_core::traits::provider::{GenerateParams, Provider};
use courseclaw_core::types::{
    FunctionCall, Message, ProviderResponse, ToolCall, ToolDefinition, Usage,
};
use serde_json::{Value, json};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "openai", "ollama").
    name: String,
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    chat_path: String,
    embeddings_path: String,
    auth_style: AuthStyle,
    /// Embedding model id and its vector length.
    embedding_model: String,
    embedding_dimensions: usize,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + CourseClawConfig.
    ///
    /// Resolution order:
    /// - API key: `config.api_key` > env vars > empty
    /// - Base URL: `config.endpoint` > env override > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &CourseClawConfig) -> Self {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
                .unwrap_or_default()
        };

        let base_url = if !config.endpoint.is_empty() {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = std::env::var(env_key).ok()?;
                    // OLLAMA_HOST is usually given without the /v1 suffix
                    if val.ends_with("/v1") {
                        Some(val)
                    } else {
                        Some(format!("{}/v1", val.trim_end_matches('/')))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            embeddings_path: registry.embeddings_path.to_string(),
            auth_style: registry.auth_style,
            embedding_model: config.embedding.model.clone(),
            embedding_dimensions: config.embedding.dimensions,
            client: reqwest::Client::new(),
        }
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &CourseClawConfig) -> Self {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            embeddings_path: "/embeddings".to_string(),
            auth_style,
            embedding_model: config.embedding.model.clone(),
            embedding_dimensions: config.embedding.dimensions,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fail fast when this backend needs a key and none is available.
    pub fn require_credentials(&self) -> Result<()> {
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(CourseClawError::ApiKeyMissing(self.name.clone()));
        }
        Ok(())
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        self.apply_auth(req).send().await.map_err(|e| {
            CourseClawError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })
    }
}

/// Build the chat completions request body.
pub fn build_chat_body(
    messages: &[Message],
    tools: &[ToolDefinition],
    params: &GenerateParams,
) -> Result<Value> {
    let mut body = json!({
        "model": params.model,
        "temperature": params.temperature,
        "max_tokens": params.max_tokens,
        "messages": serde_json::to_value(messages)?,
    });

    if !tools.is_empty() {
        let tool_defs: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = Value::Array(tool_defs);
    }

    Ok(body)
}

/// Parse a chat completions response (first choice only).
pub fn parse_chat_response(json: &Value) -> Result<ProviderResponse> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| CourseClawError::ModelCall("No choices in response".into()))?;

    let content = choice["message"]["content"].as_str().map(String::from);

    // Every requested call is kept. Non-string arguments become empty text,
    // which the tool rejects as undecodable.
    let tool_calls = choice["message"]["tool_calls"]
        .as_array()
        .map(|tc| {
            tc.iter()
                .map(|t| {
                    let arguments = match t["function"]["arguments"].as_str() {
                        Some(args) => args.to_string(),
                        None => {
                            tracing::warn!(
                                "Tool call {} has non-string arguments",
                                t["id"].as_str().unwrap_or("?")
                            );
                            String::new()
                        }
                    };
                    ToolCall {
                        id: t["id"].as_str().unwrap_or("").to_string(),
                        r#type: "function".to_string(),
                        function: FunctionCall {
                            name: t["function"]["name"].as_str().unwrap_or("").to_string(),
                            arguments,
                        },
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let usage = json["usage"].as_object().map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        completion_tokens: u
            .get("completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
        total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    });

    Ok(ProviderResponse {
        content,
        tool_calls,
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage,
    })
}

/// Parse an embeddings response, restoring input order via each item's `index`.
pub fn parse_embedding_response(json: &Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| CourseClawError::Embedding("No data in embedding response".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
        let vector = item["embedding"]
            .as_array()
            .ok_or_else(|| CourseClawError::Embedding(format!("Item {index} has no embedding")))?
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    CourseClawError::Embedding(format!("Item {index} has a non-numeric component"))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, vector));
    }

    if indexed.len() != expected {
        return Err(CourseClawError::Embedding(format!(
            "Expected {expected} embeddings, got {}",
            indexed.len()
        )));
    }

    indexed.sort_by_key(|(index, _)| *index);
    if indexed.iter().enumerate().any(|(pos, (index, _))| pos != *index) {
        return Err(CourseClawError::Embedding(
            "Embedding indices do not cover the input positions".into(),
        ));
    }
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        self.require_credentials()?;

        let body = build_chat_body(messages, tools, params)?;
        tracing::debug!(
            "{} chat: {} message(s), {} tool(s)",
            self.name,
            messages.len(),
            tools.len()
        );

        let resp = self
            .post_json(&self.chat_path, &body)
            .await
            .map_err(|e| CourseClawError::ModelCall(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CourseClawError::ModelCall(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CourseClawError::ModelCall(e.to_string()))?;

        parse_chat_response(&json)
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleProvider {
    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(CourseClawError::Embedding("empty input".into()));
        }
        self.require_credentials()?;

        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let resp = self
            .post_json(&self.embeddings_path, &body)
            .await
            .map_err(|e| CourseClawError::Embedding(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(CourseClawError::Embedding(format!(
                "{} rate limited the embedding request",
                self.name
            )));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CourseClawError::Embedding(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CourseClawError::Embedding(e.to_string()))?;

        tracing::debug!("{} embedded {} input(s)", self.name, texts.len());
        parse_embedding_response(&json, texts.len())
    }
}
