//! Provider registry: maps provider names to endpoint configurations.
//!
//! All backends are OpenAI-compatible and defined here as static entries.

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub name: &'static str,
    /// Base URL for the API.
    pub base_url: &'static str,
    /// Path for chat completions endpoint (appended to base_url).
    pub chat_path: &'static str,
    /// Path for embeddings endpoint (appended to base_url).
    pub embeddings_path: &'static str,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    /// How to send auth credentials.
    pub auth_style: AuthStyle,
    /// Environment variable to override the base URL (e.g., OLLAMA_HOST).
    pub base_url_env: Option<&'static str>,
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        env_keys: &["OPENAI_PROJECT_KEY", "OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: Some("OPENAI_BASE_URL"),
    },
    ProviderConfig {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        env_keys: &["OPENROUTER_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
    },
    ProviderConfig {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("OLLAMA_HOST"),
    },
];

/// Look up a provider config by name.
pub fn get_provider_config(name: &str) -> Option<&'static ProviderConfig> {
    let lookup = match name {
        "open_router" => "openrouter",
        "local" => "ollama",
        other => other,
    };
    PROVIDERS.iter().find(|p| p.name == lookup)
}

/// List all known provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_aliases() {
        let openai = get_provider_config("openai").unwrap();
        assert_eq!(openai.auth_style, AuthStyle::Bearer);
        assert_eq!(openai.env_keys[0], "OPENAI_PROJECT_KEY");

        assert_eq!(get_provider_config("local").unwrap().name, "ollama");
        assert!(get_provider_config("unknown").is_none());
    }

    #[test]
    fn test_all_providers_share_wire_paths() {
        for name in all_provider_names() {
            let p = get_provider_config(name).unwrap();
            assert_eq!(p.chat_path, "/chat/completions");
            assert_eq!(p.embeddings_path, "/embeddings");
        }
    }
}
