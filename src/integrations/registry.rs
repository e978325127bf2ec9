// src/integrations/registry.rs — Process-wide integration catalog

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::integrations::types::{Integration, IntegrationKind};

/// Catalog of every available integration, keyed by type id.
///
/// Built once at startup and immutable afterwards; share via `Arc` for
/// lock-free concurrent reads. The ordered backing map makes iteration —
/// and therefore catalog export — deterministic.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: BTreeMap<String, Arc<dyn Integration>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an integration. Duplicate type ids are last-write-wins;
    /// the shadowing is logged so it is visible at startup rather than
    /// silent (see DESIGN.md).
    pub fn register(&mut self, integration: Arc<dyn Integration>) {
        let type_id = integration.type_id().to_string();
        if let Some(previous) = self.integrations.insert(type_id.clone(), integration) {
            tracing::warn!(
                type_id = %type_id,
                shadowed = %previous.name(),
                "duplicate integration registration; later registration wins"
            );
        }
    }

    pub fn get(&self, type_id: &str) -> Option<Arc<dyn Integration>> {
        self.integrations.get(type_id).cloned()
    }

    pub fn has(&self, type_id: &str) -> bool {
        self.integrations.contains_key(type_id)
    }

    /// All integrations in type-id order.
    pub fn all(&self) -> Vec<Arc<dyn Integration>> {
        self.integrations.values().cloned().collect()
    }

    pub fn type_ids(&self) -> Vec<&str> {
        self.integrations.keys().map(String::as_str).collect()
    }

    /// Platform integrations: no credentials, available to every tenant.
    pub fn system_integrations(&self) -> Vec<Arc<dyn Integration>> {
        self.partition(IntegrationKind::Platform)
    }

    /// Personalized integrations: per-organisation credentials required.
    pub fn user_integrations(&self) -> Vec<Arc<dyn Integration>> {
        self.partition(IntegrationKind::Personalized)
    }

    fn partition(&self, kind: IntegrationKind) -> Vec<Arc<dyn Integration>> {
        self.integrations
            .values()
            .filter(|i| i.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::schema::ToolDefinition;
    use crate::integrations::types::ToolError;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Fake {
        type_id: &'static str,
        name: &'static str,
        kind: IntegrationKind,
    }

    #[async_trait]
    impl Integration for Fake {
        fn type_id(&self) -> &str {
            self.type_id
        }
        fn name(&self) -> &str {
            self.name
        }
        fn kind(&self) -> IntegrationKind {
            self.kind
        }
        fn tools(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new("noop", "Does nothing")]
        }
        async fn execute_tool(
            &self,
            tool: &str,
            _params: &Value,
            _credentials: Option<&crate::integrations::types::CredentialMap>,
        ) -> Result<Value, ToolError> {
            Err(self.unknown_tool(tool))
        }
    }

    fn platform(type_id: &'static str, name: &'static str) -> Arc<dyn Integration> {
        Arc::new(Fake {
            type_id,
            name,
            kind: IntegrationKind::Platform,
        })
    }

    fn personalized(type_id: &'static str, name: &'static str) -> Arc<dyn Integration> {
        Arc::new(Fake {
            type_id,
            name,
            kind: IntegrationKind::Personalized,
        })
    }

    #[test]
    fn test_lookup_and_partitions() {
        let mut registry = IntegrationRegistry::new();
        registry.register(platform("system.clock", "Clock"));
        registry.register(personalized("jira", "Jira"));

        assert!(registry.has("system.clock"));
        assert!(registry.get("jira").is_some());
        assert!(registry.get("nope").is_none());
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.system_integrations().len(), 1);
        assert_eq!(registry.user_integrations().len(), 1);
        assert_eq!(
            registry.system_integrations()[0].type_id(),
            "system.clock"
        );
    }

    #[test]
    fn test_iteration_is_ordered_by_type_id() {
        let mut registry = IntegrationRegistry::new();
        registry.register(personalized("zeta", "Z"));
        registry.register(platform("system.alpha", "A"));
        registry.register(personalized("mid", "M"));

        assert_eq!(registry.type_ids(), vec!["mid", "system.alpha", "zeta"]);
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let mut registry = IntegrationRegistry::new();
        registry.register(platform("system.clock", "First"));
        registry.register(platform("system.clock", "Second"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("system.clock").unwrap().name(), "Second");
    }
}
