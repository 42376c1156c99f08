//! Free-text course search over the record store.

use std::sync::Arc;

use courseclaw_core::error::Result;
use courseclaw_core::traits::Embedder;

use crate::store::{Hit, RecordStore};

/// Results returned per query.
pub const SEARCH_LIMIT: usize = 3;

pub struct Retriever {
    store: Arc<RecordStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(store: Arc<RecordStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Top matches with their distances, nearest first.
    pub async fn search_hits(&self, query: &str) -> Result<Vec<Hit>> {
        let embedding = self.embedder.embed_one(query).await?;
        let hits = self.store.nearest(&embedding, SEARCH_LIMIT)?;
        tracing::debug!(
            "Retrieved {} course(s) for {:?} (best distance {:?})",
            hits.len(),
            query,
            hits.first().map(|h| h.distance)
        );
        Ok(hits)
    }

    /// Rendered course lines of the top matches, nearest first.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(self
            .search_hits(query)
            .await?
            .into_iter()
            .map(|h| h.text)
            .collect())
    }
}
