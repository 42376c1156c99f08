//! # CourseClaw Tools
//!
//! Tools the model can invoke during a conversation. Today there is one:
//! `search_courses`, a thin adapter over the semantic `Retriever`.

pub mod registry;
pub mod search_courses;

pub use registry::ToolRegistry;
pub use search_courses::SearchCoursesTool;
