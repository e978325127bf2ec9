// src/integrations/oauth.rs — OAuth token material and opportunistic refresh

use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::integrations::types::CredentialMap;

/// Refresh when the access token has less than this much validity left.
pub const REFRESH_THRESHOLD_SECS: i64 = 300;

/// Credential map keys OAuth material is stored under.
const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const EXPIRES_AT: &str = "expires_at";

/// Where an OAuth-backed integration refreshes its tokens. Resolved per
/// instance, since the endpoint may embed tenant-specific parts.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub token_url: String,
}

/// The expiring token triple held inside a decrypted credential map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds). 0 means "never expires".
    pub expires_at: i64,
}

impl OAuthTokens {
    /// Extract tokens from a credential map, if both token fields are set.
    pub fn from_credentials(credentials: &CredentialMap) -> Option<Self> {
        let access_token = credentials.get_str(ACCESS_TOKEN)?.to_string();
        let refresh_token = credentials.get_str(REFRESH_TOKEN)?.to_string();
        Some(Self {
            access_token,
            refresh_token,
            expires_at: credentials.get_i64(EXPIRES_AT).unwrap_or(0),
        })
    }

    /// Write the tokens back into a credential map (the form that gets
    /// re-encrypted and persisted).
    pub fn apply_to(&self, credentials: &mut CredentialMap) {
        credentials.set(ACCESS_TOKEN, self.access_token.as_str());
        credentials.set(REFRESH_TOKEN, self.refresh_token.as_str());
        credentials.set(EXPIRES_AT, self.expires_at);
    }

    /// Whether the access token is inside the refresh window at `now`.
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at > 0 && now >= self.expires_at - REFRESH_THRESHOLD_SECS
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Posts `grant_type=refresh_token` to an integration's token endpoint.
///
/// The client carries a hard timeout so a slow identity provider cannot
/// stall the dispatch path.
pub struct TokenRefresher {
    client: reqwest::Client,
}

impl TokenRefresher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn refresh(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: Option<&str>,
        current: &OAuthTokens,
    ) -> Result<OAuthTokens> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
            ("client_id", client_id),
        ];
        if let Some(secret) = client_secret {
            form.push(("client_secret", secret));
        }

        let resp = self.client.post(token_url).form(&form).send().await?;

        if !resp.status().is_success() {
            // Status only: the error body could be logged upstream, but it
            // is not needed and keeps token material out of error strings.
            bail!("token endpoint returned {}", resp.status());
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = match token.expires_in {
            Some(secs) if secs > 0 => chrono::Utc::now().timestamp() + secs,
            _ => 0,
        };

        Ok(OAuthTokens {
            access_token: token.access_token,
            // Providers may rotate the refresh token; keep the old one
            // when they don't.
            refresh_token: token
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expires_at,
        })
    }
}
