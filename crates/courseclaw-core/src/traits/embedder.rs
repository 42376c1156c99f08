//! Embedding capability.

use async_trait::async_trait;

use crate::error::{CourseClawError, Result};

/// Turns text into fixed-length vectors.
///
/// Implementations must return exactly one vector per input, in input
/// order, and fail with [`CourseClawError::Embedding`] on empty input.
/// Nothing is cached: every call is a fresh remote computation, so callers
/// should batch.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Vector length produced by this embedder.
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single string.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CourseClawError::Embedding("no embedding returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn dimensions(&self) -> usize {
            1
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Err(CourseClawError::Embedding("empty input".into()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[tokio::test]
    async fn test_embed_one_unwraps_single_vector() {
        let v = LengthEmbedder.embed_one("abcd").await.unwrap();
        assert_eq!(v, vec![4.0]);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let texts: Vec<String> = ["a", "abc", "ab"].iter().map(|s| s.to_string()).collect();
        let out = LengthEmbedder.embed(&texts).await.unwrap();
        assert_eq!(out, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }
}
