//! Shared types for the tool system.

use crate::ai::{SearchBackend, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// JSON-Schema property descriptor for a tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn integer(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "integer".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "boolean".to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn string_array(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "array".to_string(),
            description: description.into(),
            default: None,
            items: Some(Box::new(PropertySchema::string(""))),
            enum_values: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    pub fn object(properties: HashMap<String, PropertySchema>, required: &[&str]) -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: required.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// Discriminated result kind so the orchestrator can react to structure
/// instead of sniffing rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultKind {
    Generic,
    Proposal { client_name: String },
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    pub error: Option<String>,
    pub kind: ToolResultKind,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            error: None,
            kind: ToolResultKind::Generic,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        ToolResult {
            success: false,
            content: String::new(),
            error: Some(message),
            kind: ToolResultKind::Generic,
        }
    }

    /// A generated proposal, tagged so auto-export can pick it up.
    pub fn proposal(content: impl Into<String>, client_name: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            error: None,
            kind: ToolResultKind::Proposal {
                client_name: client_name.into(),
            },
        }
    }
}

/// Execution context handed to every tool.
#[derive(Clone)]
pub struct ToolContext {
    pub generator: Arc<dyn TextGenerator>,
    pub search: Arc<dyn SearchBackend>,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_schema_serialization() {
        let schema = PropertySchema::string("Output format")
            .with_default(json!("markdown"))
            .with_enum(&["markdown", "json"]);
        let v = serde_json::to_value(&schema).unwrap();
        assert_eq!(v["type"], "string");
        assert_eq!(v["default"], "markdown");
        assert_eq!(v["enum"], json!(["markdown", "json"]));

        let plain = serde_json::to_value(PropertySchema::integer("Weeks")).unwrap();
        assert!(plain.get("default").is_none());
        assert!(plain.get("enum").is_none());
    }

    #[test]
    fn test_result_constructors() {
        let ok = ToolResult::success("done");
        assert!(ok.success);
        assert_eq!(ok.kind, ToolResultKind::Generic);

        let err = ToolResult::error("bad input");
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("bad input"));

        let proposal = ToolResult::proposal("# Proposal", "Acme Corp");
        assert_eq!(
            proposal.kind,
            ToolResultKind::Proposal {
                client_name: "Acme Corp".to_string()
            }
        );
    }
}
