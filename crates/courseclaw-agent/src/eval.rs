//! Judged evaluation runs over a TOML file of question/answer cases.
//!
//! ```toml
//! fresh_session = false
//!
//! [[case]]
//! name = "TestPhil"
//! question = "What is Phil Peterson teaching?"
//! want = "Phil Peterson is teaching CS 272 Software Development."
//! min_score = 2
//! ```

use std::path::Path;

use courseclaw_core::error::{CourseClawError, Result};
use serde::{Deserialize, Serialize};

use crate::Agent;
use crate::judge::{Score, SimilarityJudge};

fn default_min_score() -> u8 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub name: String,
    pub question: String,
    pub want: String,
    #[serde(default = "default_min_score")]
    pub min_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalSuite {
    /// Clear the conversation before each case.
    #[serde(default)]
    pub fresh_session: bool,
    #[serde(default, rename = "case")]
    pub cases: Vec<EvalCase>,
}

impl EvalSuite {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let suite: Self = toml::from_str(content)
            .map_err(|e| CourseClawError::Config(format!("Invalid eval cases: {e}")))?;
        if let Some(case) = suite.cases.iter().find(|c| !(1..=3).contains(&c.min_score)) {
            return Err(CourseClawError::Config(format!(
                "case {:?}: min_score must be 1, 2 or 3",
                case.name
            )));
        }
        Ok(suite)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalOutcome {
    pub name: String,
    pub answer: String,
    pub score: Score,
    pub min_score: u8,
}

impl EvalOutcome {
    pub fn passed(&self) -> bool {
        self.score.value() >= self.min_score
    }
}

/// Ask every case in order and judge each answer.
///
/// Model and judge failures abort the run. Low scores do not.
pub async fn run_eval(
    agent: &mut Agent,
    judge: &SimilarityJudge,
    suite: &EvalSuite,
) -> Result<Vec<EvalOutcome>> {
    let mut outcomes = Vec::with_capacity(suite.cases.len());

    for case in &suite.cases {
        if suite.fresh_session {
            agent.reset();
        }

        let answer = agent.process(&case.question).await?;
        let score = judge.score(&case.want, &answer).await?;
        let outcome = EvalOutcome {
            name: case.name.clone(),
            answer,
            score,
            min_score: case.min_score,
        };

        if outcome.passed() {
            tracing::info!("✅ [{}] judge similarity score = {}", case.name, score);
        } else {
            tracing::warn!(
                "❌ [{}] similarity {} < {} (question {:?})",
                case.name,
                score,
                case.min_score,
                case.question
            );
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
