//! Bulk loader: renders course rows, embeds them in batches, stores them.

use std::sync::Arc;

use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Embedder;

use crate::catalog::CourseRecord;
use crate::store::RecordStore;

/// Rows per embedding request. Bounds payload size and rate-limit exposure.
pub const EMBED_BATCH_SIZE: usize = 100;

/// Summary of one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Entries written during this run.
    pub inserted: usize,
    /// Embedding requests issued.
    pub batches: usize,
    /// Rows already present when the build was skipped.
    pub existing: usize,
}

pub struct IndexBuilder {
    store: Arc<RecordStore>,
    embedder: Arc<dyn Embedder>,
}

impl IndexBuilder {
    pub fn new(store: Arc<RecordStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Build only when the store is empty; otherwise report the existing rows.
    pub async fn build_if_empty(&self, records: &[CourseRecord]) -> Result<IndexReport> {
        let existing = self.store.count()?;
        if existing > 0 {
            tracing::info!("Database already loaded with {existing} courses");
            return Ok(IndexReport {
                existing,
                ..Default::default()
            });
        }
        tracing::info!("Database is empty, loading courses...");
        self.build(records).await
    }

    /// Embed and insert every record with ids 1..=N.
    ///
    /// Assumes an empty store and does not deduplicate. Any embedding or
    /// storage failure aborts the run: a partial index is not repaired.
    pub async fn build(&self, records: &[CourseRecord]) -> Result<IndexReport> {
        if self.embedder.dimensions() != self.store.dimensions() {
            return Err(CourseClawError::DimensionMismatch {
                expected: self.store.dimensions(),
                got: self.embedder.dimensions(),
            });
        }

        let lines: Vec<String> = records.iter().map(CourseRecord::render).collect();
        let total = lines.len();
        tracing::info!("Loading {total} courses into database...");

        let mut report = IndexReport::default();
        let mut next_id: i64 = 1;

        for batch in lines.chunks(EMBED_BATCH_SIZE) {
            let vectors = self.embedder.embed(batch).await?;
            report.batches += 1;

            if vectors.len() != batch.len() {
                return Err(CourseClawError::Embedding(format!(
                    "batch of {} lines produced {} embeddings",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (line, vector) in batch.iter().zip(vectors.iter()) {
                self.store.put(next_id, line, vector)?;
                next_id += 1;
                report.inserted += 1;
            }

            tracing::info!("Progress: {}/{} courses loaded", report.inserted, total);
        }

        tracing::info!("✅ Database loaded successfully!");
        Ok(report)
    }
}
