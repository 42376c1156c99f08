//! Deterministic offline embedder for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Embedder;

const VOCAB: &[&str] = &[
    "phil", "peterson", "choong", "software", "development", "rhetoric", "public",
    "speaking", "ethics", "guitar", "bioinformatics", "philosophy", "cs", "rhet", "lm",
];

/// Bag-of-words over a fixed vocabulary, L2-normalized.
pub(crate) struct KeywordEmbedder {
    calls: Mutex<Vec<usize>>,
    fail_after: Option<usize>,
}

impl KeywordEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Succeeds for `n` calls, then returns `Embedding` errors.
    pub(crate) fn failing_after(n: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_after: Some(n),
        }
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; VOCAB.len()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if let Some(i) = VOCAB.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(CourseClawError::Embedding("empty input".into()));
        }
        let mut calls = self.calls.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if calls.len() >= limit {
                return Err(CourseClawError::Embedding("backend unavailable".into()));
            }
        }
        calls.push(texts.len());
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}
