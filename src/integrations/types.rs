// src/integrations/types.rs — Integration capability contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::infra::errors::DispatchError;
use crate::integrations::oauth::OAuthConfig;
use crate::integrations::schema::{CredentialField, CredentialFieldType, ToolDefinition};

/// The two capability variants. Platform integrations (`system.*`) need no
/// per-organisation credentials and are available to every tenant;
/// personalized integrations require credentials and contribute an agent
/// system-prompt fragment.
///
/// A sum type rather than a flag so dispatch and export sites can match
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
    Platform,
    Personalized,
}

/// Decrypted per-organisation credentials: a flat JSON object keyed by
/// credential field name. Transient — lives for the duration of one
/// dispatch call and is never persisted in plaintext.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialMap(BTreeMap<String, Value>);

impl CredentialMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the plaintext JSON produced by the credential cipher.
    pub fn from_json(plaintext: &str) -> anyhow::Result<Self> {
        let map: BTreeMap<String, Value> = serde_json::from_str(plaintext)?;
        Ok(Self(map))
    }

    /// Serialize back to the JSON form the cipher encrypts.
    pub fn to_json(&self) -> String {
        // A string-keyed map of JSON values always serializes
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Failure of a single tool invocation inside an adapter.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("integration '{integration}' has no tool named '{tool}'")]
    UnknownTool { integration: String, tool: String },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// The unit of pluggability: one adapter exposing a named set of callable
/// tools for an external service or local utility domain.
///
/// Implementations are constructed once at process start, hold no mutable
/// state (at most a shared HTTP client), and live for the process lifetime
/// behind the registry.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Globally unique, stable type id. Registry key; `system.*` is the
    /// platform namespace.
    fn type_id(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> &str;

    fn kind(&self) -> IntegrationKind;

    fn requires_credentials(&self) -> bool {
        matches!(self.kind(), IntegrationKind::Personalized)
    }

    /// Static tool catalog. Must not depend on credentials — they are not
    /// known at catalog-fetch time.
    fn tools(&self) -> Vec<ToolDefinition>;

    fn credential_fields(&self) -> Vec<CredentialField> {
        Vec::new()
    }

    fn is_experimental(&self) -> bool {
        false
    }

    fn setup_instructions(&self) -> Option<&str> {
        None
    }

    /// Agent prompt fragment describing how to use this integration's
    /// tools. Personalized integrations return one; a per-instance
    /// override wins when present. Platform integrations return None.
    fn system_prompt(&self, override_prompt: Option<&str>) -> Option<String> {
        let _ = override_prompt;
        None
    }

    /// Token endpoint for OAuth-backed integrations, resolved against the
    /// decrypted credentials (the endpoint may embed e.g. a tenant id).
    /// None for everything else.
    fn oauth(&self, credentials: &CredentialMap) -> Option<OAuthConfig> {
        let _ = credentials;
        None
    }

    /// Structural credential check run before an instance is activated:
    /// required fields present, URL/email fields roughly well-formed.
    /// Does not guarantee the credentials work against the remote service.
    fn validate_credentials(&self, credentials: &CredentialMap) -> Result<(), DispatchError> {
        validate_against_fields(&self.credential_fields(), credentials)
    }

    /// Dispatch entry point. Fails `UnknownTool` when `tool` is not in
    /// [`tools()`](Integration::tools). For personalized integrations the
    /// caller guarantees `credentials` is `Some` — enforcing that is the
    /// dispatch layer's job, not the adapter's.
    async fn execute_tool(
        &self,
        tool: &str,
        params: &Value,
        credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError>;

    fn has_tool(&self, tool: &str) -> bool {
        self.tools().iter().any(|t| t.name == tool)
    }

    /// Helper for the `_ =>` arm of an adapter's tool match.
    fn unknown_tool(&self, tool: &str) -> ToolError {
        ToolError::UnknownTool {
            integration: self.type_id().to_string(),
            tool: tool.to_string(),
        }
    }
}

/// Default structural validation driven by the declared credential schema.
pub fn validate_against_fields(
    fields: &[CredentialField],
    credentials: &CredentialMap,
) -> Result<(), DispatchError> {
    for field in fields {
        // OAuth material is produced by an authorization flow, not typed
        // in by a user; its absence is handled at dispatch time.
        if field.field_type == CredentialFieldType::OAuth {
            continue;
        }

        let value = credentials.get_str(&field.name).map(str::trim);
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ if field.required => {
                return Err(DispatchError::ValidationFailed {
                    reason: format!("required field '{}' is missing", field.name),
                })
            }
            _ => continue,
        };

        match field.field_type {
            CredentialFieldType::Url => {
                let parsed = url::Url::parse(value).map_err(|_| DispatchError::ValidationFailed {
                    reason: format!("field '{}' is not a valid URL", field.name),
                })?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(DispatchError::ValidationFailed {
                        reason: format!("field '{}' must be an http(s) URL", field.name),
                    });
                }
            }
            CredentialFieldType::Email => {
                let well_formed = value
                    .split_once('@')
                    .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
                if !well_formed {
                    return Err(DispatchError::ValidationFailed {
                        reason: format!("field '{}' is not a valid email address", field.name),
                    });
                }
            }
            CredentialFieldType::Text
            | CredentialFieldType::Password
            | CredentialFieldType::OAuth => {}
        }
    }
    Ok(())
}
