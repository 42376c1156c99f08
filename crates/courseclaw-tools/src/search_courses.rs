//! `search_courses`: semantic catalog lookup exposed to the model.

use std::sync::Arc;

use async_trait::async_trait;
use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Tool;
use courseclaw_core::types::ToolDefinition;
use courseclaw_knowledge::Retriever;
use serde::Deserialize;

use crate::registry::validate_args;

pub const TOOL_NAME: &str = "search_courses";

/// Decoded arguments of a `search_courses` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

impl SearchArgs {
    /// Decode the model's raw argument text. Invalid JSON, a missing
    /// `query`, or a non-string `query` all fail with `ToolArgument`.
    pub fn parse(definition: &ToolDefinition, arguments: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(arguments)
            .map_err(|e| CourseClawError::ToolArgument(e.to_string()))?;
        validate_args(definition, &value).map_err(CourseClawError::ToolArgument)?;
        serde_json::from_value(value).map_err(|e| CourseClawError::ToolArgument(e.to_string()))
    }
}

pub struct SearchCoursesTool {
    retriever: Arc<Retriever>,
}

impl SearchCoursesTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for SearchCoursesTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME.into(),
            description: "Search the course database for courses matching the query. Use this to \
                          find courses by instructor, subject, location, topic, or any other course \
                          attribute."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search key information for course. Can be an instructor name, \
                                        course subject/department, building/location or any relevant keyword."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Newline-joined course lines, nearest first.
    async fn execute(&self, arguments: &str) -> Result<String> {
        let args = SearchArgs::parse(&self.definition(), arguments)?;
        tracing::info!("🔎 search_courses({:?})", args.query);
        let lines = self.retriever.search(&args.query).await?;
        Ok(lines.join("\n"))
    }
}
