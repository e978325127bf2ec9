// src/cli/export.rs — Catalog export command

use anyhow::bail;

use crate::integrations::adapters::builtin_registry;
use crate::integrations::export::{self, CatalogScope};

pub fn run_export(scope: &str, format: &str, output: Option<&str>) -> anyhow::Result<()> {
    let registry = builtin_registry();
    let scope: CatalogScope = scope.parse()?;

    let content = match format {
        "xml" => export::catalog_xml(&registry, scope),
        "json" => {
            let mut text = serde_json::to_string_pretty(&export::catalog_json(&registry, scope))?;
            text.push('\n');
            text
        }
        other => bail!("unknown export format '{other}'"),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            tracing::info!("catalog written to {path}");
        }
        None => print!("{content}"),
    }
    Ok(())
}
