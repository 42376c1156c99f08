//! # CourseClaw Knowledge
//!
//! Semantic index over the course catalog.
//!
//! ## Design
//! - **CSV catalog**: header-bearing export, one course section per row
//! - **Labeled rendering**: each row becomes a self-describing text line
//! - **SQLite store**: id, text and embedding blob per course
//! - **Exact nearest-neighbor**: L2 distance computed in Rust, top 3
//!
//! ## How it works
//! ```text
//! courses.csv
//!   ↓ CatalogReader (skip malformed rows)
//! "SUBJ:CS Number:272 ... Instructor:Phil Peterson ..."
//!   ↓ batches of 100 → Embedder
//! RecordStore (id 1..N)
//!
//! "Phil Peterson"
//!   ↓ Embedder → RecordStore::nearest(k = 3)
//! Top 3 course lines, nearest first
//! ```

pub mod catalog;
pub mod indexer;
pub mod retriever;
pub mod store;

pub use catalog::{CatalogReader, CourseCatalog, CourseRecord};
pub use indexer::{IndexBuilder, IndexReport};
pub use retriever::Retriever;
pub use store::{Hit, RecordStore};

#[cfg(test)]
pub(crate) mod test_support;
