//! Single-shot completion and the answer-similarity judge.

use std::fmt;
use std::sync::Arc;

use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Provider;
use courseclaw_core::traits::provider::GenerateParams;
use courseclaw_core::types::Message;

const JUDGE_SYSTEM_PROMPT: &str = "You are an analyst for AI evaluation.
Score how similar the answer is to the expected answer, on a scale of 1–3:
1 = Low similarity (wrong or off-topic)
2 = Medium similarity
3 = High similarity (correct and complete)

Respond ONLY with the number 1, 2, or 3.";

/// Text and token usage of a stateless completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub total_tokens: u32,
}

/// One system + user exchange with no tools and no session history.
pub async fn complete(
    provider: &dyn Provider,
    params: &GenerateParams,
    system: &str,
    user: &str,
) -> Result<Completion> {
    let messages = [Message::system(system), Message::user(user)];
    let response = provider.chat(&messages, &[], params).await?;
    let total_tokens = response.total_tokens();
    Ok(Completion {
        content: response.content.unwrap_or_default(),
        total_tokens,
    })
}

/// Judged similarity between an expected and an actual answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Score {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Score {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Parse the judge's reply. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim() {
            "1" => Ok(Self::Low),
            "2" => Ok(Self::Medium),
            "3" => Ok(Self::High),
            _ => Err(CourseClawError::InvalidJudgement(text.to_string())),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Asks a model to grade an answer against the expected one.
pub struct SimilarityJudge {
    provider: Arc<dyn Provider>,
    params: GenerateParams,
}

impl SimilarityJudge {
    pub fn new(provider: Arc<dyn Provider>, params: GenerateParams) -> Self {
        Self { provider, params }
    }

    pub async fn score(&self, expected: &str, actual: &str) -> Result<Score> {
        let user = format!("Expected answer:\n{expected}\n\nChat answer:\n{actual}");
        let completion =
            complete(self.provider.as_ref(), &self.params, JUDGE_SYSTEM_PROMPT, &user).await?;
        tracing::debug!(
            "Judge replied {:?} ({} tokens)",
            completion.content,
            completion.total_tokens
        );
        Score::parse(&completion.content)
    }
}
