//! Tool registry: lookup by name and definition listing.

use courseclaw_core::traits::Tool;
use courseclaw_core::types::ToolDefinition;

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        tracing::debug!("Registered tool: {}", tool.name());
        self.tools.push(tool);
    }

    /// Find a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Validate that a tool call has the required arguments.
pub fn validate_args(definition: &ToolDefinition, args: &serde_json::Value) -> Result<(), String> {
    let params = &definition.parameters;
    if let Some(required) = params.get("required").and_then(|r| r.as_array()) {
        for req in required {
            if let Some(key) = req.as_str() {
                if args.get(key).is_none() {
                    return Err(format!("Missing required argument: {key}"));
                }
            }
        }
    }
    Ok(())
}
