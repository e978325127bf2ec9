// src/integrations/adapters/websearch.rs — Key-authenticated web search

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::integrations::params;
use crate::integrations::schema::{
    CredentialField, CredentialFieldType, ParameterType, ToolDefinition,
};
use crate::integrations::types::{CredentialMap, Integration, IntegrationKind, ToolError};

const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

const SYSTEM_PROMPT: &str = "<integration name=\"Web Search\">\n\
    Search the public web. Prefer a few precise queries over many broad \
    ones; results carry a title, URL and snippet.\n\
    </integration>";

/// Web search adapter (Brave-compatible API).
pub struct WebSearchIntegration {
    client: Client,
}

impl WebSearchIntegration {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn web_search(
        &self,
        credentials: &CredentialMap,
        params: &Value,
    ) -> anyhow::Result<Value> {
        let api_key = credentials
            .get_str("api_key")
            .ok_or_else(|| anyhow!("credential 'api_key' is missing"))?;
        let endpoint = credentials
            .get_str("endpoint")
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/');

        let query = params::str_arg(params, "query")?;
        let count = params::i64_arg_or(params, "count", 10).clamp(1, 20);

        let resp = self
            .client
            .get(endpoint)
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            bail!("search API returned {status}");
        }

        let body: SearchResp = resp.json().await?;
        let results: Vec<Value> = body
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .map(|hit| {
                json!({
                    "title": hit.title,
                    "url": hit.url,
                    "snippet": hit.description.unwrap_or_default(),
                })
            })
            .collect();

        Ok(json!({ "results": results }))
    }
}

impl Default for WebSearchIntegration {
    fn default() -> Self {
        Self::new()
    }
}

// -- Search API types --

#[derive(Deserialize)]
struct SearchResp {
    web: Option<WebResults>,
}

#[derive(Deserialize)]
struct WebResults {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
    url: String,
    description: Option<String>,
}

#[async_trait]
impl Integration for WebSearchIntegration {
    fn type_id(&self) -> &str {
        "websearch"
    }

    fn name(&self) -> &str {
        "Web Search"
    }

    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Personalized
    }

    fn is_experimental(&self) -> bool {
        true
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new("web_search", "Search the public web")
            .param("query", ParameterType::String, true, "Search query")
            .param(
                "count",
                ParameterType::Integer,
                false,
                "Number of results (default 10, max 20)",
            )]
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("api_key", CredentialFieldType::Password, "API key"),
            CredentialField::new("endpoint", CredentialFieldType::Url, "API endpoint")
                .optional()
                .with_placeholder(DEFAULT_ENDPOINT),
        ]
    }

    fn system_prompt(&self, override_prompt: Option<&str>) -> Option<String> {
        Some(
            override_prompt
                .map(str::to_string)
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        )
    }

    async fn execute_tool(
        &self,
        tool: &str,
        params: &Value,
        credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError> {
        let creds = credentials.ok_or_else(|| anyhow!("credentials were not supplied"))?;
        let result = match tool {
            "web_search" => self.web_search(creds, params).await,
            _ => return Err(self.unknown_tool(tool)),
        };
        result.map_err(ToolError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_experimental_personalized() {
        let search = WebSearchIntegration::new();
        assert!(search.is_experimental());
        assert!(search.requires_credentials());
    }

    #[test]
    fn test_optional_endpoint_field() {
        let search = WebSearchIntegration::new();

        // api_key alone is enough
        let mut creds = CredentialMap::new();
        creds.set("api_key", "k");
        assert!(search.validate_credentials(&creds).is_ok());

        // a malformed endpoint is rejected when present
        creds.set("endpoint", "not-a-url");
        assert!(search.validate_credentials(&creds).is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails() {
        let search = WebSearchIntegration::new();
        let err = search
            .execute_tool(
                "web_search",
                &json!({"query": "rust"}),
                Some(&CredentialMap::new()),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }
}
