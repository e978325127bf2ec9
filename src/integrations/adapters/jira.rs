// src/integrations/adapters/jira.rs — Jira issue tracker adapter (REST API v2)

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

const SYSTEM_PROMPT: &str = "<integration name=\"Jira\">\n\
    Work with the organisation's Jira issue tracker. Search with a JQL \
    query (search_issues) before creating new issues; create_issue needs \
    a project key and a one-line summary. Keep comments factual and brief.\n\
    </integration>";

/// Jira adapter. One instance per process; per-organisation account
/// details arrive with each call.
pub struct JiraIntegration {
    client: Client,
}

/// Decrypted account details for one call.
struct JiraAccount<'a> {
    base_url: String,
    email: &'a str,
    api_token: &'a str,
}

impl JiraIntegration {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn account<'a>(&self, credentials: Option<&'a CredentialMap>) -> anyhow::Result<JiraAccount<'a>> {
        let creds = credentials.ok_or_else(|| anyhow!("credentials were not supplied"))?;
        let base_url = creds
            .get_str("base_url")
            .ok_or_else(|| anyhow!("credential 'base_url' is missing"))?
            .trim_end_matches('/')
            .to_string();
        let email = creds
            .get_str("email")
            .ok_or_else(|| anyhow!("credential 'email' is missing"))?;
        let api_token = creds
            .get_str("api_token")
            .ok_or_else(|| anyhow!("credential 'api_token' is missing"))?;
        Ok(JiraAccount {
            base_url,
            email,
            api_token,
        })
    }

    async fn api_get<T: serde::de::DeserializeOwned>(
        &self,
        account: &JiraAccount<'_>,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = format!("{}{path}", account.base_url);
        let resp = self
            .client
            .get(&url)
            .basic_auth(account.email, Some(account.api_token))
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Jira API {path} returned {status}: {body}");
        }

        Ok(resp.json().await?)
    }

    async fn api_post<T: serde::de::DeserializeOwned>(
        &self,
        account: &JiraAccount<'_>,
        path: &str,
        body: &Value,
    ) -> anyhow::Result<T> {
        let url = format!("{}{path}", account.base_url);
        let resp = self
            .client
            .post(&url)
            .basic_auth(account.email, Some(account.api_token))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Jira API {path} returned {status}: {body}");
        }

        Ok(resp.json().await?)
    }

    async fn create_issue(
        &self,
        account: &JiraAccount<'_>,
        params: &Value,
    ) -> anyhow::Result<Value> {
        let project = params::str_arg(params, "project")?;
        let summary = params::str_arg(params, "summary")?;
        let body = json!({
            "fields": {
                "project": { "key": project },
                "summary": summary,
                "description": params::opt_str_arg(params, "description").unwrap_or_default(),
                "issuetype": {
                    "name": params::opt_str_arg(params, "issue_type").unwrap_or("Task")
                },
            }
        });

        let created: CreatedIssue = self.api_post(account, "/rest/api/2/issue", &body).await?;
        Ok(json!({
            "key": created.key,
            "id": created.id,
            "url": format!("{}/browse/{}", account.base_url, created.key),
        }))
    }

    async fn get_issue(&self, account: &JiraAccount<'_>, params: &Value) -> anyhow::Result<Value> {
        let key = params::str_arg(params, "issue_key")?;
        let issue: IssueResp = self
            .api_get(
                account,
                &format!("/rest/api/2/issue/{key}"),
                &[("fields", "summary,status,description".to_string())],
            )
            .await?;
        Ok(issue_to_value(&issue))
    }

    async fn search_issues(
        &self,
        account: &JiraAccount<'_>,
        params: &Value,
    ) -> anyhow::Result<Value> {
        let jql = params::str_arg(params, "jql")?;
        let max_results = params::i64_arg_or(params, "max_results", 20).clamp(1, 100);
        let resp: SearchResp = self
            .api_get(
                account,
                "/rest/api/2/search",
                &[
                    ("jql", jql.to_string()),
                    ("maxResults", max_results.to_string()),
                    ("fields", "summary,status".to_string()),
                ],
            )
            .await?;

        let issues: Vec<Value> = resp.issues.iter().map(issue_to_value).collect();
        Ok(json!({ "total": resp.total, "issues": issues }))
    }

    async fn add_comment(
        &self,
        account: &JiraAccount<'_>,
        params: &Value,
    ) -> anyhow::Result<Value> {
        let key = params::str_arg(params, "issue_key")?;
        let body = params::str_arg(params, "body")?;
        let comment: CommentResp = self
            .api_post(
                account,
                &format!("/rest/api/2/issue/{key}/comment"),
                &json!({ "body": body }),
            )
            .await?;
        Ok(json!({ "id": comment.id }))
    }
}

impl Default for JiraIntegration {
    fn default() -> Self {
        Self::new()
    }
}

// -- Jira API types --

#[derive(Deserialize)]
struct CreatedIssue {
    id: String,
    key: String,
}

#[derive(Deserialize)]
struct IssueResp {
    key: String,
    fields: Option<IssueFields>,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: Option<String>,
    description: Option<String>,
    status: Option<IssueStatus>,
}

#[derive(Deserialize)]
struct IssueStatus {
    name: Option<String>,
}

#[derive(Deserialize)]
struct SearchResp {
    total: i64,
    issues: Vec<IssueResp>,
}

#[derive(Deserialize)]
struct CommentResp {
    id: String,
}

fn issue_to_value(issue: &IssueResp) -> Value {
    let fields = issue.fields.as_ref();
    json!({
        "key": issue.key,
        "summary": fields.and_then(|f| f.summary.as_deref()).unwrap_or_default(),
        "status": fields
            .and_then(|f| f.status.as_ref())
            .and_then(|s| s.name.as_deref())
            .unwrap_or_default(),
        "description": fields.and_then(|f| f.description.as_deref()).unwrap_or_default(),
    })
}

#[async_trait]
impl Integration for JiraIntegration {
    fn type_id(&self) -> &str {
        "jira"
    }

    fn name(&self) -> &str {
        "Jira"
    }

    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Personalized
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("create_issue", "Create a new Jira issue")
                .param("project", ParameterType::String, true, "Project key, e.g. OPS")
                .param("summary", ParameterType::String, true, "One-line issue summary")
                .param("description", ParameterType::String, false, "Issue body text")
                .param(
                    "issue_type",
                    ParameterType::String,
                    false,
                    "Issue type name (default Task)",
                ),
            ToolDefinition::new("get_issue", "Fetch a single issue by key")
                .param("issue_key", ParameterType::String, true, "Issue key, e.g. OPS-17"),
            ToolDefinition::new("search_issues", "Search issues with a JQL query")
                .param("jql", ParameterType::String, true, "JQL query string")
                .param(
                    "max_results",
                    ParameterType::Integer,
                    false,
                    "Maximum issues to return (default 20, max 100)",
                ),
            ToolDefinition::new("add_comment", "Add a comment to an issue")
                .param("issue_key", ParameterType::String, true, "Issue key, e.g. OPS-17")
                .param("body", ParameterType::String, true, "Comment text"),
        ]
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("base_url", CredentialFieldType::Url, "Site URL")
                .with_placeholder("https://your-site.atlassian.net"),
            CredentialField::new("email", CredentialFieldType::Email, "Account email"),
            CredentialField::new("api_token", CredentialFieldType::Password, "API token")
                .with_description("Create one under Atlassian account settings, Security"),
        ]
    }

    fn setup_instructions(&self) -> Option<&str> {
        Some(
            "Create an API token in your Atlassian account (Security → API tokens) \
             and enter it together with the account email and your site URL.",
        )
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
        let account = self.account(credentials)?;
        let result = match tool {
            "create_issue" => self.create_issue(&account, params).await,
            "get_issue" => self.get_issue(&account, params).await,
            "search_issues" => self.search_issues(&account, params).await,
            "add_comment" => self.add_comment(&account, params).await,
            _ => return Err(self.unknown_tool(tool)),
        };
        result.map_err(ToolError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::types::validate_against_fields;

    #[test]
    fn test_credential_validation() {
        let jira = JiraIntegration::new();

        let mut creds = CredentialMap::new();
        creds.set("base_url", "https://acme.atlassian.net");
        creds.set("email", "bot@acme.com");
        creds.set("api_token", "tok");
        assert!(jira.validate_credentials(&creds).is_ok());

        creds.set("base_url", "acme.atlassian.net");
        assert!(validate_against_fields(&jira.credential_fields(), &creds).is_err());
    }

    #[test]
    fn test_prompt_override_wins() {
        let jira = JiraIntegration::new();
        assert!(jira.system_prompt(None).unwrap().contains("Jira"));
        assert_eq!(
            jira.system_prompt(Some("Custom guidance.")).unwrap(),
            "Custom guidance."
        );
    }

    #[tokio::test]
    async fn test_execute_without_credentials_fails() {
        let jira = JiraIntegration::new();
        let err = jira
            .execute_tool("get_issue", &json!({"issue_key": "OPS-1"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_checked_before_network() {
        let jira = JiraIntegration::new();
        let mut creds = CredentialMap::new();
        creds.set("base_url", "https://acme.atlassian.net");
        creds.set("email", "bot@acme.com");
        creds.set("api_token", "tok");

        let err = jira
            .execute_tool("delete_project", &json!({}), Some(&creds))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }
}
