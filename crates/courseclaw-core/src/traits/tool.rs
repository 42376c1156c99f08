//! Host-side tools the model may invoke.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ToolDefinition;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the raw JSON argument text from the model.
    ///
    /// Undecodable arguments must be reported as
    /// [`CourseClawError::ToolArgument`](crate::error::CourseClawError::ToolArgument).
    async fn execute(&self, arguments: &str) -> Result<String>;
}
