// src/integrations/adapters/mod.rs — Built-in integration adapters

pub mod clock;
pub mod filegen;
pub mod jira;
pub mod sharepoint;
pub mod websearch;

use std::sync::Arc;

use crate::integrations::registry::IntegrationRegistry;

/// Assemble the registry of built-in integrations. Adding an integration
/// is one registration line here — there is no runtime discovery.
pub fn builtin_registry() -> IntegrationRegistry {
    let mut registry = IntegrationRegistry::new();
    registry.register(Arc::new(clock::ClockIntegration::new()));
    registry.register(Arc::new(filegen::FileGenIntegration::new()));
    registry.register(Arc::new(jira::JiraIntegration::new()));
    registry.register(Arc::new(sharepoint::SharePointIntegration::new()));
    registry.register(Arc::new(websearch::WebSearchIntegration::new()));
    registry
}
