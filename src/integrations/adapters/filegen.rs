// src/integrations/adapters/filegen.rs — Platform file-content generation

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::integrations::params;
use crate::integrations::schema::{ParameterType, ToolDefinition};
use crate::integrations::types::{CredentialMap, Integration, IntegrationKind, ToolError};

/// Generates file content (CSV, formatted JSON) from structured input.
/// No credentials; the caller decides where the content ends up.
#[derive(Default)]
pub struct FileGenIntegration;

impl FileGenIntegration {
    pub fn new() -> Self {
        Self
    }

    fn generate_csv(&self, params: &Value) -> anyhow::Result<Value> {
        let rows_raw = params::str_arg(params, "rows")?;
        let rows: Vec<Map<String, Value>> = serde_json::from_str(rows_raw)
            .map_err(|_| anyhow!("'rows' must be a JSON array of flat objects"))?;

        let delimiter = match params::opt_str_arg(params, "delimiter") {
            Some(d) if d.len() == 1 => d.as_bytes()[0],
            Some(_) => bail!("'delimiter' must be a single character"),
            None => b',',
        };

        // Header order: first-seen key order across all rows, so output is
        // stable for a given input.
        let mut headers: Vec<&str> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        writer.write_record(&headers)?;
        for row in &rows {
            let record: Vec<String> = headers
                .iter()
                .map(|header| match row.get(*header) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect();
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("csv flush failed: {e}"))?;
        let content = String::from_utf8(bytes)?;
        Ok(json!({ "content": content, "rows": rows.len() }))
    }

    fn generate_json(&self, params: &Value) -> anyhow::Result<Value> {
        let text = params::str_arg(params, "text")?;
        let parsed: Value =
            serde_json::from_str(text).map_err(|e| anyhow!("'text' is not valid JSON: {e}"))?;

        let content = if params::bool_arg_or(params, "pretty", true) {
            serde_json::to_string_pretty(&parsed)?
        } else {
            serde_json::to_string(&parsed)?
        };
        Ok(json!({ "content": content }))
    }
}

#[async_trait]
impl Integration for FileGenIntegration {
    fn type_id(&self) -> &str {
        "system.files"
    }

    fn name(&self) -> &str {
        "File Generation"
    }

    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Platform
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("generate_csv", "Build a CSV document from structured rows")
                .param(
                    "rows",
                    ParameterType::String,
                    true,
                    "JSON array of flat objects; keys become columns",
                )
                .param(
                    "delimiter",
                    ParameterType::String,
                    false,
                    "Field delimiter, a single character (default comma)",
                ),
            ToolDefinition::new("generate_json", "Validate and reformat a JSON document")
                .param("text", ParameterType::String, true, "JSON text to format")
                .param(
                    "pretty",
                    ParameterType::Boolean,
                    false,
                    "Indent the output (default true)",
                ),
        ]
    }

    async fn execute_tool(
        &self,
        tool: &str,
        params: &Value,
        _credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError> {
        let result = match tool {
            "generate_csv" => self.generate_csv(params),
            "generate_json" => self.generate_json(params),
            _ => return Err(self.unknown_tool(tool)),
        };
        result.map_err(ToolError::Failed)
    }
}
