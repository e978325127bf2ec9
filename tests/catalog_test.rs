// tests/catalog_test.rs — Catalog export scenarios

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;

use toolgate::integrations::adapters::builtin_registry;
use toolgate::integrations::export::{catalog_json, catalog_xml, CatalogScope};
use toolgate::integrations::registry::IntegrationRegistry;
use toolgate::integrations::schema::{ParameterType, ToolDefinition};
use toolgate::integrations::types::{CredentialMap, Integration, IntegrationKind, ToolError};

// ---------- Fixture integrations ----------

struct EchoIntegration;

#[async_trait]
impl Integration for EchoIntegration {
    fn type_id(&self) -> &str {
        "system.echo"
    }
    fn name(&self) -> &str {
        "Echo"
    }
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Platform
    }
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new("echo", "Echo the input back").param(
            "text",
            ParameterType::String,
            true,
            "Text to echo",
        )]
    }
    async fn execute_tool(
        &self,
        tool: &str,
        _params: &Value,
        _credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError> {
        Err(self.unknown_tool(tool))
    }
}

struct TrackerIntegration {
    name: &'static str,
}

#[async_trait]
impl Integration for TrackerIntegration {
    fn type_id(&self) -> &str {
        "tracker"
    }
    fn name(&self) -> &str {
        self.name
    }
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Personalized
    }
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new("list_items", "List tracked items")]
    }
    async fn execute_tool(
        &self,
        tool: &str,
        _params: &Value,
        _credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError> {
        Err(self.unknown_tool(tool))
    }
}

fn fixture_registry() -> IntegrationRegistry {
    let mut registry = IntegrationRegistry::new();
    registry.register(Arc::new(TrackerIntegration { name: "Tracker" }));
    registry.register(Arc::new(EchoIntegration));
    registry
}

// ---------- Scenarios ----------

#[test]
fn test_echo_catalog_shape() {
    let registry = fixture_registry();
    let xml = catalog_xml(&registry, CatalogScope::System);

    assert!(xml.contains("<integration type=\"system.echo\" name=\"Echo\" category=\"system\">"));
    assert!(xml.contains("<tool name=\"echo\">"));
    assert!(xml.contains("<description>Echo the input back</description>"));
    assert!(xml.contains("<parameter name=\"text\" type=\"string\" required=\"true\">"));
    assert!(xml.contains("<description>Text to echo</description>"));
    // The personalized integration is outside the system scope
    assert!(!xml.contains("tracker"));
}

#[test]
fn test_export_is_deterministic() {
    let registry = fixture_registry();
    assert_eq!(
        catalog_xml(&registry, CatalogScope::All),
        catalog_xml(&registry, CatalogScope::All)
    );

    // Byte-identical across independently built registries too
    assert_eq!(
        catalog_xml(&fixture_registry(), CatalogScope::All),
        catalog_xml(&registry, CatalogScope::All)
    );

    assert_eq!(
        catalog_json(&registry, CatalogScope::All),
        catalog_json(&fixture_registry(), CatalogScope::All)
    );
}

#[test]
fn test_scope_partitions() {
    let registry = fixture_registry();

    let all = catalog_json(&registry, CatalogScope::All);
    let integrations = all["integrations"].as_array().unwrap();
    assert_eq!(integrations.len(), 2);
    // Ordered by type id: "system.echo" < "tracker"
    assert_eq!(integrations[0]["type"], "system.echo");
    assert_eq!(integrations[0]["category"], "system");
    assert_eq!(integrations[1]["type"], "tracker");
    assert_eq!(integrations[1]["category"], "user");

    let system = catalog_json(&registry, CatalogScope::System);
    assert_eq!(system["integrations"].as_array().unwrap().len(), 1);

    let user = catalog_json(&registry, CatalogScope::User);
    assert_eq!(user["integrations"].as_array().unwrap().len(), 1);
    assert_eq!(user["integrations"][0]["type"], "tracker");
}

#[test]
fn test_duplicate_registration_last_write_wins() {
    let mut registry = IntegrationRegistry::new();
    registry.register(Arc::new(TrackerIntegration { name: "First" }));
    registry.register(Arc::new(TrackerIntegration { name: "Second" }));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("tracker").unwrap().name(), "Second");

    let xml = catalog_xml(&registry, CatalogScope::All);
    assert!(xml.contains("name=\"Second\""));
    assert!(!xml.contains("name=\"First\""));
}

#[test]
fn test_builtin_catalog_exports() {
    let registry = builtin_registry();

    let xml = catalog_xml(&registry, CatalogScope::All);
    assert!(xml.starts_with("<integrations>"));
    assert!(xml.trim_end().ends_with("</integrations>"));
    assert!(xml.contains("<integration type=\"system.clock\" name=\"Clock\" category=\"system\">"));
    assert!(xml.contains("<integration type=\"jira\" name=\"Jira\" category=\"user\">"));

    // Tools without parameters still carry a parameters element
    assert!(xml.contains("<tool name=\"list_recent_files\">"));
    assert!(xml.contains("<parameters/>"));

    // Stable across repeated export
    assert_eq!(xml, catalog_xml(&builtin_registry(), CatalogScope::All));
}

#[test]
fn test_xml_escapes_markup_in_descriptions() {
    struct Weird;

    #[async_trait]
    impl Integration for Weird {
        fn type_id(&self) -> &str {
            "weird"
        }
        fn name(&self) -> &str {
            "A & B <Tools>"
        }
        fn kind(&self) -> IntegrationKind {
            IntegrationKind::Platform
        }
        fn tools(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new("cmp", "Compare a < b && b > c")]
        }
        async fn execute_tool(
            &self,
            tool: &str,
            _params: &Value,
            _credentials: Option<&CredentialMap>,
        ) -> Result<Value, ToolError> {
            Err(self.unknown_tool(tool))
        }
    }

    let mut registry = IntegrationRegistry::new();
    registry.register(Arc::new(Weird));

    let xml = catalog_xml(&registry, CatalogScope::All);
    assert!(xml.contains("name=\"A &amp; B &lt;Tools&gt;\""));
    assert!(xml.contains("<description>Compare a &lt; b &amp;&amp; b &gt; c</description>"));
}
