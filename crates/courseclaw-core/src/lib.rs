//! # CourseClaw Core
//!
//! Shared building blocks for every CourseClaw crate:
//! - **types**: chat messages, tool calls, provider responses
//! - **traits**: the `Provider`, `Embedder` and `Tool` capability seams
//! - **config**: TOML configuration with env-var credential lookup
//! - **error**: the `CourseClawError` taxonomy

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::CourseClawConfig;
pub use error::{CourseClawError, Result};
