// src/infra/errors.rs — Error types for toolgate

use thiserror::Error;

/// Failure modes of the dispatch pipeline, ordered roughly by the stage
/// that detects them. Lookup and gating errors (`NotFound` through
/// `CredentialsMissing`) are raised before any outbound call is made.
///
/// Display messages are safe to return to callers: they never contain
/// plaintext credentials or ciphertext. The underlying causes of
/// `DecryptionFailed` and `ExecutionFailed` are logged server-side only.
#[derive(Error, Debug)]
pub enum DispatchError {
    // Lookup / gating (fail fast, no side effects)
    #[error("integration instance not found")]
    NotFound,

    #[error("integration instance is deactivated")]
    Inactive,

    #[error("tool '{tool}' is disabled for this instance")]
    ToolDisabled { tool: String },

    #[error("integration type '{integration_type}' is not registered")]
    UnknownIntegrationType { integration_type: String },

    #[error("integration '{integration}' has no tool named '{tool}'")]
    UnknownTool { integration: String, tool: String },

    // Credentials
    #[error("integration instance has no stored credentials")]
    CredentialsMissing,

    #[error("stored credentials could not be decrypted")]
    DecryptionFailed,

    #[error("credential validation failed: {reason}")]
    ValidationFailed { reason: String },

    // Adapter-level
    #[error("tool execution failed: {message}")]
    ExecutionFailed { message: String },

    // Infra
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DispatchError {
    /// Stable machine-readable code for API payloads and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::ToolDisabled { .. } => "tool_disabled",
            Self::UnknownIntegrationType { .. } => "unknown_integration_type",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::CredentialsMissing => "credentials_missing",
            Self::DecryptionFailed => "decryption_failed",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Storage(_) => "storage_error",
        }
    }
}
