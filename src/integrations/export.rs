// src/integrations/export.rs — Deterministic catalog materialization

use serde_json::{json, Value};
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use crate::integrations::registry::IntegrationRegistry;
use crate::integrations::types::{Integration, IntegrationKind};

/// Which slice of the registry to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogScope {
    #[default]
    All,
    /// Platform integrations only.
    System,
    /// Personalized integrations only.
    User,
}

impl FromStr for CatalogScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            other => Err(anyhow::anyhow!("unknown catalog scope '{other}'")),
        }
    }
}

/// Select the integrations for a scope, in registry (type-id) order.
pub fn select(registry: &IntegrationRegistry, scope: CatalogScope) -> Vec<Arc<dyn Integration>> {
    match scope {
        CatalogScope::All => registry.all(),
        CatalogScope::System => registry.system_integrations(),
        CatalogScope::User => registry.user_integrations(),
    }
}

fn category(integration: &dyn Integration) -> &'static str {
    match integration.kind() {
        IntegrationKind::Platform => "system",
        IntegrationKind::Personalized => "user",
    }
}

/// Render the XML catalog for a scope. Deterministic: the same registry
/// content always yields byte-identical output.
pub fn catalog_xml(registry: &IntegrationRegistry, scope: CatalogScope) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_catalog_xml(&mut buf, &select(registry, scope));
    String::from_utf8(buf).unwrap_or_default()
}

/// Stream the XML catalog to any writer.
pub fn write_catalog_xml<W: Write>(
    mut out: W,
    integrations: &[Arc<dyn Integration>],
) -> io::Result<()> {
    writeln!(out, "<integrations>")?;
    for integration in integrations {
        writeln!(
            out,
            "  <integration type=\"{}\" name=\"{}\" category=\"{}\">",
            escape(integration.type_id()),
            escape(integration.name()),
            category(integration.as_ref()),
        )?;
        for tool in integration.tools() {
            writeln!(out, "    <tool name=\"{}\">", escape(&tool.name))?;
            writeln!(
                out,
                "      <description>{}</description>",
                escape(&tool.description)
            )?;
            if tool.parameters.is_empty() {
                writeln!(out, "      <parameters/>")?;
            } else {
                writeln!(out, "      <parameters>")?;
                for param in &tool.parameters {
                    let open = format!(
                        "<parameter name=\"{}\" type=\"{}\" required=\"{}\"",
                        escape(&param.name),
                        param.param_type.as_str(),
                        param.required,
                    );
                    if param.description.is_empty() {
                        writeln!(out, "        {open}/>")?;
                    } else {
                        writeln!(out, "        {open}>")?;
                        writeln!(
                            out,
                            "          <description>{}</description>",
                            escape(&param.description)
                        )?;
                        writeln!(out, "        </parameter>")?;
                    }
                }
                writeln!(out, "      </parameters>")?;
            }
            writeln!(out, "    </tool>")?;
        }
        writeln!(out, "  </integration>")?;
    }
    writeln!(out, "</integrations>")?;
    Ok(())
}

/// JSON rendering of the same catalog, for callers that prefer it.
pub fn catalog_json(registry: &IntegrationRegistry, scope: CatalogScope) -> Value {
    let integrations: Vec<Value> = select(registry, scope)
        .iter()
        .map(|integration| {
            json!({
                "type": integration.type_id(),
                "name": integration.name(),
                "category": category(integration.as_ref()),
                "tools": integration.tools(),
            })
        })
        .collect();
    json!({ "integrations": integrations })
}

/// Minimal XML escaping for text nodes and attribute values.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\"'d'"), "a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<CatalogScope>().unwrap(), CatalogScope::All);
        assert_eq!(
            "system".parse::<CatalogScope>().unwrap(),
            CatalogScope::System
        );
        assert_eq!("user".parse::<CatalogScope>().unwrap(), CatalogScope::User);
        assert!("everything".parse::<CatalogScope>().is_err());
    }
}
