// src/integrations/adapters/clock.rs — Platform time utilities

use async_trait::async_trait;
use chrono::format::{strftime::StrftimeItems, Item};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::integrations::params;
use crate::integrations::schema::{ParameterType, ToolDefinition};
use crate::integrations::types::{CredentialMap, Integration, IntegrationKind, ToolError};

/// Wall-clock utilities, available to every organisation.
#[derive(Default)]
pub struct ClockIntegration;

impl ClockIntegration {
    pub fn new() -> Self {
        Self
    }

    fn current_time(&self, params: &Value) -> anyhow::Result<Value> {
        let now = Utc::now();
        Ok(json!({
            "time": render(now, params::opt_str_arg(params, "format"))?,
            "unix": now.timestamp(),
        }))
    }

    fn format_timestamp(&self, params: &Value) -> anyhow::Result<Value> {
        let timestamp = params::i64_arg(params, "timestamp")?;
        let time = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("timestamp {timestamp} is out of range"))?;
        Ok(json!({
            "time": render(time, params::opt_str_arg(params, "format"))?,
        }))
    }
}

fn render(time: DateTime<Utc>, format: Option<&str>) -> anyhow::Result<String> {
    let Some(fmt) = format else {
        return Ok(time.to_rfc3339());
    };
    // Validate the format string first: DelayedFormat panics on write
    // when it hits an unsupported specifier.
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        anyhow::bail!("invalid format string '{fmt}'");
    }
    Ok(time.format_with_items(items.into_iter()).to_string())
}

#[async_trait]
impl Integration for ClockIntegration {
    fn type_id(&self) -> &str {
        "system.clock"
    }

    fn name(&self) -> &str {
        "Clock"
    }

    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Platform
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("current_time", "Get the current UTC date and time")
                .param(
                    "format",
                    ParameterType::String,
                    false,
                    "strftime-style format string; RFC 3339 when omitted",
                ),
            ToolDefinition::new("format_timestamp", "Render a unix timestamp as a date string")
                .param(
                    "timestamp",
                    ParameterType::Integer,
                    true,
                    "Unix timestamp in seconds",
                )
                .param(
                    "format",
                    ParameterType::String,
                    false,
                    "strftime-style format string; RFC 3339 when omitted",
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
            "current_time" => self.current_time(params),
            "format_timestamp" => self.format_timestamp(params),
            _ => return Err(self.unknown_tool(tool)),
        };
        result.map_err(ToolError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_current_time() {
        let clock = ClockIntegration::new();
        let result = clock
            .execute_tool("current_time", &json!({}), None)
            .await
            .unwrap();
        assert!(result["time"].as_str().unwrap().contains('T'));
        assert!(result["unix"].as_i64().unwrap() > 1_700_000_000);
    }

    #[tokio::test]
    async fn test_format_timestamp() {
        let clock = ClockIntegration::new();
        let result = clock
            .execute_tool(
                "format_timestamp",
                &json!({"timestamp": 0, "format": "%Y-%m-%d"}),
                None,
            )
            .await
            .unwrap();
        assert_eq!(result["time"], "1970-01-01");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let clock = ClockIntegration::new();
        let err = clock
            .execute_tool("sunrise", &json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn test_invalid_format_string_is_an_error() {
        let clock = ClockIntegration::new();
        let err = clock
            .execute_tool("current_time", &json!({"format": "%Q%!"}), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("format"));
    }

    #[tokio::test]
    async fn test_missing_timestamp_fails() {
        let clock = ClockIntegration::new();
        let err = clock
            .execute_tool("format_timestamp", &json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
    }
}
