// src/integrations/mod.rs — Capability registry and tool dispatch layer

pub mod adapters;
pub mod dispatch;
pub mod export;
pub mod oauth;
pub mod params;
pub mod registry;
pub mod schema;
pub mod types;

pub use dispatch::Dispatcher;
pub use registry::IntegrationRegistry;
pub use schema::{CredentialField, CredentialFieldType, ParameterSpec, ParameterType, ToolDefinition};
pub use types::{CredentialMap, Integration, IntegrationKind, ToolError};
