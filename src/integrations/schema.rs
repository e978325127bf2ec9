// src/integrations/schema.rs — Tool and credential schema value objects

use serde::{Deserialize, Serialize};

/// Wire-level type of a tool parameter. The vocabulary is closed: the
/// catalog grammar consumed by the agent engine depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// One callable operation, described for consumption by an automated agent.
///
/// Parameter names are unique within a tool; [`ToolDefinition::param`]
/// enforces this at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let definition = Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        };
        debug_assert!(
            !definition.description.is_empty(),
            "tool '{}' needs a description",
            definition.name
        );
        definition
    }

    /// Builder: append a parameter. Panics in debug builds on a duplicate
    /// parameter name (a static catalog bug, caught by the adapter's tests).
    pub fn param(
        mut self,
        name: impl Into<String>,
        param_type: ParameterType,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        debug_assert!(
            !self.parameters.iter().any(|p| p.name == name),
            "tool '{}' declares parameter '{}' twice",
            self.name,
            name
        );
        self.parameters.push(ParameterSpec {
            name,
            param_type,
            required,
            description: description.into(),
        });
        self
    }
}

/// Kind of credential input an integration asks an organisation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialFieldType {
    Text,
    Url,
    Email,
    Password,
    /// Filled by an authorization flow, not typed in by a user.
    OAuth,
}

/// One configuration input an integration needs. Drives structural
/// validation here and credential-entry form rendering elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CredentialFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CredentialField {
    pub fn new(
        name: impl Into<String>,
        field_type: CredentialFieldType,
        label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: label.into(),
            placeholder: None,
            required: true,
            description: None,
        }
    }

    /// Builder: mark the field optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Builder: set the placeholder shown in entry forms.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Builder: set the help text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_builder() {
        let tool = ToolDefinition::new("create_issue", "Create an issue")
            .param("project", ParameterType::String, true, "Project key")
            .param("summary", ParameterType::String, true, "Issue summary")
            .param("priority", ParameterType::Integer, false, "");

        assert_eq!(tool.parameters.len(), 3);
        assert_eq!(tool.parameters[0].name, "project");
        assert!(tool.parameters[0].required);
        assert!(!tool.parameters[2].required);
    }

    #[test]
    #[should_panic(expected = "twice")]
    #[cfg(debug_assertions)]
    fn test_duplicate_parameter_panics() {
        let _ = ToolDefinition::new("t", "d")
            .param("x", ParameterType::String, true, "")
            .param("x", ParameterType::String, false, "");
    }

    #[test]
    fn test_parameter_type_serializes_lowercase() {
        let param = ParameterSpec {
            name: "count".into(),
            param_type: ParameterType::Integer,
            required: false,
            description: String::new(),
        };
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "integer");
        // Empty descriptions are omitted from the wire form
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_credential_field_builder() {
        let field = CredentialField::new("base_url", CredentialFieldType::Url, "Base URL")
            .with_placeholder("https://example.atlassian.net")
            .with_description("Root URL of your site");
        assert!(field.required);
        assert_eq!(field.field_type, CredentialFieldType::Url);

        let optional = CredentialField::new("region", CredentialFieldType::Text, "Region").optional();
        assert!(!optional.required);
    }
}
