//! # CourseClaw Agent
//! The dialogue engine: one linear conversation with a single tool pass.
//!
//! ## Flow per question
//! 1. Append the user turn and call the model with the tool definitions.
//! 2. No tool calls → the model's text is the answer (one round-trip).
//! 3. Tool calls → run each in order, append one tool turn per call, then
//!    call the model once more without tools (two round-trips, never more).
//!
//! History is append-only and owned by the session; nothing is trimmed.

pub mod eval;
pub mod judge;

use std::sync::Arc;

use courseclaw_core::config::CourseClawConfig;
use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Provider;
use courseclaw_core::traits::provider::GenerateParams;
use courseclaw_core::types::{Message, ProviderResponse, ToolCall};
use courseclaw_tools::ToolRegistry;

/// Tool result text when the model's arguments cannot be decoded.
pub const TOOL_ARGUMENT_ERROR: &str = "Error parsing arguments";

/// Answer used when the post-tool response has no usable text.
pub const FALLBACK_ANSWER: &str =
    "I found some information but couldn't formulate a response. Please try again.";

/// Counters for the most recent `process` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TurnStats {
    /// Model round-trips (1 or 2).
    pub model_calls: usize,
    /// Tool invocations executed.
    pub tool_calls: usize,
    /// Sum of `total_tokens` over the round-trips.
    pub total_tokens: u32,
}

impl TurnStats {
    fn record(&mut self, response: &ProviderResponse) {
        self.model_calls += 1;
        self.total_tokens += response.total_tokens();
    }
}

/// The course assistant: owns one conversation.
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    params: GenerateParams,
    conversation: Vec<Message>,
    last_stats: TurnStats,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        params: GenerateParams,
        system_prompt: &str,
    ) -> Self {
        Self {
            provider,
            tools,
            params,
            conversation: vec![Message::system(system_prompt)],
            last_stats: TurnStats::default(),
        }
    }

    /// Create an agent using the configured model and persona.
    pub fn from_config(
        config: &CourseClawConfig,
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
    ) -> Self {
        let params = GenerateParams {
            model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };
        Self::new(provider, tools, params, &config.identity.system_prompt)
    }

    /// Answer one user question.
    ///
    /// Model failures are returned as errors; the turns appended before the
    /// failure stay in the history.
    pub async fn process(&mut self, user_message: &str) -> Result<String> {
        let mut stats = TurnStats::default();
        self.conversation.push(Message::user(user_message));

        let tool_defs = self.tools.list();
        let response = self
            .provider
            .chat(&self.conversation, &tool_defs, &self.params)
            .await?;
        stats.record(&response);

        let content = response.content.clone().unwrap_or_default();
        self.conversation.push(Message::assistant_with_tools(
            content.clone(),
            response.tool_calls.clone(),
        ));

        if response.tool_calls.is_empty() {
            tracing::info!("Tokens: {}", response.total_tokens());
            self.last_stats = stats;
            return Ok(content);
        }

        tracing::info!("Tool round: {} tool call(s)", response.tool_calls.len());
        for tc in &response.tool_calls {
            let output = self.run_tool(tc).await;
            self.conversation
                .push(Message::tool(output, &tc.function.name, &tc.id));
            stats.tool_calls += 1;
        }

        // Tools are withheld here so the reply is always text and no call is left unanswered.
        let final_response = self
            .provider
            .chat(&self.conversation, &[], &self.params)
            .await?;
        stats.record(&final_response);

        if !final_response.tool_calls.is_empty() {
            tracing::warn!(
                "Ignoring {} tool call(s) requested after the tool round",
                final_response.tool_calls.len()
            );
        }

        tracing::info!("Tokens: {}", final_response.total_tokens());
        self.last_stats = stats;

        let final_content = final_response.content.unwrap_or_default();
        self.conversation
            .push(Message::assistant(final_content.clone()));

        if final_content.trim().is_empty() {
            return Ok(FALLBACK_ANSWER.to_string());
        }
        Ok(final_content)
    }

    /// Execute one tool call. Failures become tool-result text, never errors.
    async fn run_tool(&self, tc: &ToolCall) -> String {
        tracing::info!(
            "  → {} ({})",
            tc.function.name,
            tc.function.arguments.chars().take(100).collect::<String>()
        );

        let Some(tool) = self.tools.get(&tc.function.name) else {
            tracing::warn!("Model requested unknown tool {:?}", tc.function.name);
            return format!("Tool not found: {}", tc.function.name);
        };

        match tool.execute(&tc.function.arguments).await {
            Ok(output) => output,
            Err(CourseClawError::ToolArgument(e)) => {
                tracing::warn!("Bad arguments for {}: {e}", tc.function.name);
                TOOL_ARGUMENT_ERROR.to_string()
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {e}", tc.function.name);
                format!("Tool error: {e}")
            }
        }
    }

    /// Get provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Get model name.
    pub fn model_name(&self) -> &str {
        &self.params.model
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Get conversation history.
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    /// Drop everything after the system prompt.
    pub fn reset(&mut self) {
        self.conversation.truncate(1);
        self.last_stats = TurnStats::default();
    }

    /// Counters from the last `process` call.
    pub fn last_stats(&self) -> &TurnStats {
        &self.last_stats
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, search_tools};
    use courseclaw_core::types::Role;

    fn agent(provider: Arc<ScriptedProvider>) -> Agent {
        Agent::new(provider, search_tools(), GenerateParams::default(), "You help with courses.")
    }

    #[tokio::test]
    async fn test_direct_answer_uses_one_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            "Hello! Ask me about courses.",
        )]));
        let mut agent = agent(provider.clone());

        let answer = agent.process("hi").await.unwrap();
        assert_eq!(answer, "Hello! Ask me about courses.");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(agent.last_stats().model_calls, 1);
        assert_eq!(agent.last_stats().tool_calls, 0);

        let request = provider.request(0);
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, "search_courses");
        assert_eq!(agent.conversation().len(), 3);
    }

    #[tokio::test]
    async fn test_tool_round_is_bounded_to_two_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![
                ToolCall::function("call_1", "search_courses", r#"{"query":"Phil Peterson"}"#),
                ToolCall::function("call_2", "search_courses", r#"{"query":"guitar"}"#),
            ]),
            ScriptedProvider::text("Phil Peterson teaches CS 272 Software Development."),
        ]));
        let mut agent = agent(provider.clone());

        let answer = agent.process("What does Phil Peterson teach?").await.unwrap();
        assert_eq!(answer, "Phil Peterson teaches CS 272 Software Development.");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(agent.last_stats().tool_calls, 2);
        assert_eq!(agent.last_stats().total_tokens, 20);

        // system, user, assistant(tool calls), tool, tool, assistant
        let roles: Vec<Role> = agent.conversation().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Tool, Role::Assistant]
        );

        let first_result = &agent.conversation()[3];
        assert_eq!(first_result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(first_result.name.as_deref(), Some("search_courses"));
        assert!(first_result.content.contains("Instructor:Phil Peterson"));
        assert_eq!(agent.conversation()[4].tool_call_id.as_deref(), Some("call_2"));

        let follow_up = provider.request(1);
        assert_eq!(follow_up.messages.len(), 5);
        assert!(follow_up.tools.is_empty());
    }

    #[tokio::test]
    async fn test_chained_tool_request_is_not_executed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function(
                "call_1",
                "search_courses",
                r#"{"query":"ethics"}"#,
            )]),
            ScriptedProvider::tool_calls(vec![ToolCall::function(
                "call_2",
                "search_courses",
                r#"{"query":"more"}"#,
            )]),
            ScriptedProvider::text("never reached"),
        ]));
        let mut agent = agent(provider.clone());

        let answer = agent.process("ethics?").await.unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_final_answer_falls_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function(
                "call_1",
                "search_courses",
                r#"{"query":"guitar"}"#,
            )]),
            ScriptedProvider::text("  \n\t "),
        ]));
        let mut agent = agent(provider);

        let answer = agent.process("Can I learn guitar?").await.unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
        let last = agent.conversation().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "  \n\t ");
    }

    #[tokio::test]
    async fn test_bad_arguments_become_fixed_tool_result() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function(
                "call_1",
                "search_courses",
                "{query: oops",
            )]),
            ScriptedProvider::text("Sorry, I could not search."),
        ]));
        let mut agent = agent(provider.clone());

        let answer = agent.process("broken").await.unwrap();
        assert_eq!(answer, "Sorry, I could not search.");
        assert_eq!(agent.conversation()[3].content, TOOL_ARGUMENT_ERROR);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_arguments_still_run_tool_phase() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function("call_1", "search_courses", "")]),
            ScriptedProvider::text(""),
        ]));
        let mut agent = agent(provider.clone());

        let answer = agent.process("Who teaches CS 272?").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(agent.conversation()[3].content, TOOL_ARGUMENT_ERROR);
        assert_eq!(agent.conversation()[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_in_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function("call_1", "shell", "{}")]),
            ScriptedProvider::text("ok"),
        ]));
        let mut agent = agent(provider);
        agent.process("run ls").await.unwrap();
        assert_eq!(agent.conversation()[3].content, "Tool not found: shell");
    }

    #[tokio::test]
    async fn test_second_question_sees_full_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![ToolCall::function(
                "call_1",
                "search_courses",
                r#"{"query":"Phil Choong"}"#,
            )]),
            ScriptedProvider::text("Phil Choong teaches RHET 103."),
            ScriptedProvider::text("It meets MWF."),
        ]));
        let mut agent = agent(provider.clone());

        agent.process("What does Phil Choong teach?").await.unwrap();
        agent.process("When does it meet?").await.unwrap();

        let third = provider.request(2);
        let roles: Vec<Role> = third.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(third.messages[1].content, "What does Phil Choong teach?");
        assert_eq!(third.messages[5].content, "When does it meet?");
    }

    #[tokio::test]
    async fn test_model_failure_is_returned() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut agent = agent(provider);
        let err = agent.process("hello?").await.unwrap_err();
        assert!(matches!(err, CourseClawError::ModelCall(_)));
        assert_eq!(agent.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_keeps_system_prompt() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text("hi")]));
        let mut agent = agent(provider);
        agent.process("hello").await.unwrap();
        agent.reset();
        assert_eq!(agent.conversation().len(), 1);
        assert_eq!(agent.conversation()[0].role, Role::System);
        assert_eq!(agent.last_stats(), &TurnStats::default());
    }

    #[test]
    fn test_from_config_uses_persona_and_model() {
        let config = CourseClawConfig::default();
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let agent = Agent::from_config(&config, provider, search_tools());
        assert_eq!(agent.model_name(), "gpt-4o-mini");
        assert_eq!(agent.provider_name(), "scripted");
        assert_eq!(agent.tool_count(), 1);
        assert_eq!(agent.conversation()[0].content, config.identity.system_prompt);
    }
}
