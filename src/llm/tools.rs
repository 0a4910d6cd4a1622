//! Tool definitions for LLM function calling.

use serde::{Deserialize, Serialize};

/// Tool definition for LLM function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// A tool that takes no arguments.
    pub fn no_args(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// A tool that takes a single required string argument.
    pub fn single_string_arg(
        name: impl Into<String>,
        description: impl Into<String>,
        arg_name: &str,
        arg_description: &str,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    arg_name: {
                        "type": "string",
                        "description": arg_description
                    }
                },
                "required": [arg_name]
            }),
        }
    }

    /// Name of the first required argument, if any.
    pub fn required_arg(&self) -> Option<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .and_then(|v| v.as_str())
    }
}
