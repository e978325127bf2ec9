// src/api/types.rs — Request/response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::integrations::schema::CredentialField;

/// Request body for POST /api/v1/execute.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    pub instance_id: Uuid,
    pub tool_name: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Request body for PUT /api/v1/instances/{id}/credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    /// Flat JSON object keyed by credential field name.
    pub credentials: Value,
}

/// Integration metadata for UI collaborators.
#[derive(Debug, Serialize)]
pub struct IntegrationView {
    #[serde(rename = "type")]
    pub type_id: String,
    pub name: String,
    pub category: &'static str,
    pub requires_credentials: bool,
    pub experimental: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_instructions: Option<String>,
    pub credential_fields: Vec<CredentialField>,
}

/// Per-organisation activation summary. The ciphertext itself is never
/// exposed, only its presence.
#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub integration_type: String,
    pub active: bool,
    pub has_credentials: bool,
    pub disabled_tools: Vec<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
