// src/integrations/adapters/sharepoint.rs — SharePoint document store (Microsoft Graph)

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::integrations::oauth::OAuthConfig;
use crate::integrations::params;
use crate::integrations::schema::{
    CredentialField, CredentialFieldType, ParameterType, ToolDefinition,
};
use crate::integrations::types::{CredentialMap, Integration, IntegrationKind, ToolError};

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

const SYSTEM_PROMPT: &str = "<integration name=\"SharePoint\">\n\
    Search and manage files in the organisation's SharePoint drive. Use \
    search_files to locate documents by name or content, list_recent_files \
    for what changed lately, and upload_text_file to store generated \
    content. Uploads overwrite files with the same name.\n\
    </integration>";

/// SharePoint adapter backed by Microsoft Graph. OAuth tokens live in the
/// per-organisation credential blob; the dispatch layer refreshes them
/// against the tenant's token endpoint when they near expiry.
pub struct SharePointIntegration {
    client: Client,
}

impl SharePointIntegration {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn access_token<'a>(&self, credentials: Option<&'a CredentialMap>) -> anyhow::Result<&'a str> {
        credentials
            .and_then(|c| c.get_str("access_token"))
            .ok_or_else(|| anyhow!("no access token; connect the Microsoft account first"))
    }

    async fn api_get<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
    ) -> anyhow::Result<T> {
        let url = format!("{GRAPH_API_BASE}{path}");
        let resp = self.client.get(&url).bearer_auth(token).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Graph API {path} returned {status}: {body}");
        }

        Ok(resp.json().await?)
    }

    async fn search_files(&self, token: &str, params: &Value) -> anyhow::Result<Value> {
        let query = params::str_arg(params, "query")?;
        // Graph's search() path segment takes a single-quoted literal
        let path = format!(
            "/me/drive/root/search(q='{}')?$top=20",
            query.replace('\'', "''")
        );
        let resp: DriveItemsResp = self.api_get(token, &path).await?;
        Ok(json!({ "files": resp.value.iter().map(item_to_value).collect::<Vec<_>>() }))
    }

    async fn list_recent_files(&self, token: &str) -> anyhow::Result<Value> {
        let resp: DriveItemsResp = self.api_get(token, "/me/drive/recent?$top=20").await?;
        Ok(json!({ "files": resp.value.iter().map(item_to_value).collect::<Vec<_>>() }))
    }

    async fn upload_text_file(&self, token: &str, params: &Value) -> anyhow::Result<Value> {
        let name = params::str_arg(params, "name")?;
        let content = params::str_arg(params, "content")?;
        if name.contains('/') || name.contains(':') {
            bail!("'name' must be a plain file name");
        }

        let url = format!("{GRAPH_API_BASE}/me/drive/root:/{name}:/content");
        let resp = self
            .client
            .put(&url)
            .bearer_auth(token)
            .header("Content-Type", "text/plain")
            .body(content.to_string())
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Graph API upload returned {status}: {body}");
        }

        let item: DriveItem = resp.json().await?;
        Ok(item_to_value(&item))
    }
}

impl Default for SharePointIntegration {
    fn default() -> Self {
        Self::new()
    }
}

// -- Graph API types --

#[derive(Deserialize)]
struct DriveItemsResp {
    value: Vec<DriveItem>,
}

#[derive(Deserialize)]
struct DriveItem {
    id: String,
    name: String,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    size: Option<i64>,
}

fn item_to_value(item: &DriveItem) -> Value {
    json!({
        "id": item.id,
        "name": item.name,
        "url": item.web_url,
        "size": item.size,
    })
}

#[async_trait]
impl Integration for SharePointIntegration {
    fn type_id(&self) -> &str {
        "sharepoint"
    }

    fn name(&self) -> &str {
        "SharePoint"
    }

    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Personalized
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("search_files", "Search files in the organisation's drive")
                .param("query", ParameterType::String, true, "Search terms"),
            ToolDefinition::new("list_recent_files", "List recently used files"),
            ToolDefinition::new("upload_text_file", "Upload a text file to the drive root")
                .param("name", ParameterType::String, true, "File name, e.g. report.md")
                .param("content", ParameterType::String, true, "File content"),
        ]
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("tenant_id", CredentialFieldType::Text, "Directory (tenant) ID")
                .with_description("From the Azure app registration overview"),
            CredentialField::new("client_id", CredentialFieldType::Text, "Application (client) ID"),
            CredentialField::new("client_secret", CredentialFieldType::Password, "Client secret"),
            CredentialField::new("oauth", CredentialFieldType::OAuth, "Microsoft account")
                .with_description("Connected through the Microsoft authorization flow"),
        ]
    }

    fn setup_instructions(&self) -> Option<&str> {
        Some(
            "Register an application in Azure AD with Files.ReadWrite delegated \
             permission, then connect a Microsoft account through the \
             authorization flow.",
        )
    }

    fn system_prompt(&self, override_prompt: Option<&str>) -> Option<String> {
        Some(
            override_prompt
                .map(str::to_string)
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        )
    }

    fn oauth(&self, credentials: &CredentialMap) -> Option<OAuthConfig> {
        let tenant = credentials.get_str("tenant_id").unwrap_or("common");
        Some(OAuthConfig {
            token_url: format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"),
        })
    }

    async fn execute_tool(
        &self,
        tool: &str,
        params: &Value,
        credentials: Option<&CredentialMap>,
    ) -> Result<Value, ToolError> {
        let token = self.access_token(credentials)?;
        let result = match tool {
            "search_files" => self.search_files(token, params).await,
            "list_recent_files" => self.list_recent_files(token).await,
            "upload_text_file" => self.upload_text_file(token, params).await,
            _ => return Err(self.unknown_tool(tool)),
        };
        result.map_err(ToolError::Failed)
    }
}
