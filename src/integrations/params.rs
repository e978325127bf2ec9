// src/integrations/params.rs — Tool parameter extraction helpers

use anyhow::{anyhow, Result};
use serde_json::Value;

/// A required string parameter.
pub fn str_arg<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing required parameter '{name}'"))
}

/// An optional string parameter.
pub fn opt_str_arg<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}

/// A required integer parameter.
pub fn i64_arg(params: &Value, name: &str) -> Result<i64> {
    params
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("missing required integer parameter '{name}'"))
}

/// An optional integer parameter with a default.
pub fn i64_arg_or(params: &Value, name: &str, default: i64) -> i64 {
    params.get(name).and_then(Value::as_i64).unwrap_or(default)
}

/// An optional boolean parameter with a default.
pub fn bool_arg_or(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}
