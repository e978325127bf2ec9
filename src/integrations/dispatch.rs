// src/integrations/dispatch.rs — Tool dispatch with credential injection

use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::infra::errors::DispatchError;
use crate::integrations::oauth::{OAuthTokens, TokenRefresher};
use crate::integrations::registry::IntegrationRegistry;
use crate::integrations::types::{CredentialMap, Integration, ToolError};
use crate::store::{InstanceStore, IntegrationInstance};
use crate::store::crypto::CredentialCipher;

/// Routes an incoming `(organisation, instance, tool, parameters)` call to
/// the right integration, enforcing tenant isolation and the instance's
/// activation/disablement gates, and injecting just-in-time decrypted
/// credentials.
///
/// Stateless per call: concurrent dispatches never contend on anything in
/// this layer. Idempotence and rate limiting toward third-party APIs are
/// the individual adapter's concern.
pub struct Dispatcher {
    registry: Arc<IntegrationRegistry>,
    store: Arc<dyn InstanceStore>,
    cipher: Arc<CredentialCipher>,
    refresher: TokenRefresher,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<IntegrationRegistry>,
        store: Arc<dyn InstanceStore>,
        cipher: Arc<CredentialCipher>,
        refresher: TokenRefresher,
    ) -> Self {
        Self {
            registry,
            store,
            cipher,
            refresher,
        }
    }

    pub fn registry(&self) -> &IntegrationRegistry {
        &self.registry
    }

    /// Execute one tool call on behalf of an organisation.
    ///
    /// All lookup and gating failures are raised before any outbound call
    /// is attempted. An instance owned by another organisation reports
    /// `NotFound` — indistinguishable from a missing instance, so tenants
    /// cannot probe for each other's activations.
    pub async fn dispatch(
        &self,
        organisation_id: Uuid,
        instance_id: Uuid,
        tool_name: &str,
        parameters: &Value,
    ) -> Result<Value, DispatchError> {
        let instance = self
            .store
            .get(instance_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if instance.organisation_id != organisation_id {
            tracing::warn!(
                instance = %instance_id,
                caller_organisation = %organisation_id,
                "cross-tenant dispatch attempt rejected"
            );
            return Err(DispatchError::NotFound);
        }

        if !instance.active {
            return Err(DispatchError::Inactive);
        }

        if instance.disabled_tools.contains(tool_name) {
            return Err(DispatchError::ToolDisabled {
                tool: tool_name.to_string(),
            });
        }

        let integration = self.registry.get(&instance.integration_type).ok_or_else(|| {
            DispatchError::UnknownIntegrationType {
                integration_type: instance.integration_type.clone(),
            }
        })?;

        let credentials = if integration.requires_credentials() {
            Some(self.resolve_credentials(&instance, integration.as_ref()).await?)
        } else {
            None
        };

        tracing::debug!(
            integration = %instance.integration_type,
            tool = %tool_name,
            organisation = %organisation_id,
            "dispatching tool call"
        );

        match integration
            .execute_tool(tool_name, parameters, credentials.as_ref())
            .await
        {
            Ok(result) => Ok(result),
            Err(ToolError::UnknownTool { integration, tool }) => {
                Err(DispatchError::UnknownTool { integration, tool })
            }
            Err(ToolError::Failed(cause)) => {
                tracing::error!(
                    integration = %instance.integration_type,
                    tool = %tool_name,
                    error = ?cause,
                    "tool execution failed"
                );
                Err(DispatchError::ExecutionFailed {
                    message: cause.to_string(),
                })
            }
        }
    }

    /// Decrypt the instance's credential blob, refreshing OAuth tokens
    /// opportunistically when they are close to expiry.
    async fn resolve_credentials(
        &self,
        instance: &IntegrationInstance,
        integration: &dyn Integration,
    ) -> Result<CredentialMap, DispatchError> {
        let ciphertext = instance
            .encrypted_credentials
            .as_deref()
            .ok_or(DispatchError::CredentialsMissing)?;

        let plaintext = self.cipher.decrypt(ciphertext).map_err(|e| {
            tracing::error!(instance = %instance.id, error = %e, "credential decryption failed");
            DispatchError::DecryptionFailed
        })?;

        let mut credentials = CredentialMap::from_json(&plaintext).map_err(|e| {
            tracing::error!(instance = %instance.id, error = %e, "credential payload is not a JSON object");
            DispatchError::DecryptionFailed
        })?;

        self.maybe_refresh_oauth(instance, integration, &mut credentials)
            .await;

        Ok(credentials)
    }

    /// Refresh the access token when it has less than the threshold of
    /// validity left. A refresh failure is logged and the stale
    /// credentials are passed through — the adapter call will surface it
    /// as an ordinary auth failure, which the caller can act on.
    async fn maybe_refresh_oauth(
        &self,
        instance: &IntegrationInstance,
        integration: &dyn Integration,
        credentials: &mut CredentialMap,
    ) {
        let Some(config) = integration.oauth(credentials) else {
            return;
        };
        let Some(tokens) = OAuthTokens::from_credentials(credentials) else {
            return;
        };
        if !tokens.needs_refresh(chrono::Utc::now().timestamp()) {
            return;
        }

        let client_id = credentials.get_str("client_id").unwrap_or_default().to_string();
        let client_secret = credentials.get_str("client_secret").map(str::to_string);

        match self
            .refresher
            .refresh(
                &config.token_url,
                &client_id,
                client_secret.as_deref(),
                &tokens,
            )
            .await
        {
            Ok(fresh) => {
                fresh.apply_to(credentials);
                match self.cipher.encrypt(&credentials.to_json()) {
                    Ok(ciphertext) => {
                        if let Err(e) = self
                            .store
                            .set_credentials(instance.id, Some(ciphertext))
                            .await
                        {
                            tracing::warn!(
                                instance = %instance.id,
                                error = %e,
                                "failed to persist refreshed credentials"
                            );
                        } else {
                            tracing::debug!(instance = %instance.id, "access token refreshed");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            instance = %instance.id,
                            error = %e,
                            "failed to re-encrypt refreshed credentials"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    instance = %instance.id,
                    integration = %instance.integration_type,
                    error = %e,
                    "token refresh failed; continuing with stale credentials"
                );
            }
        }
    }
}
