// src/api/handlers.rs

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{auth, types::*, ApiState};
use crate::infra::errors::DispatchError;
use crate::integrations::export::{self, CatalogScope};
use crate::integrations::types::{CredentialMap, IntegrationKind};
use crate::store::IntegrationInstance;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn dispatch_error(err: DispatchError) -> ApiError {
    let status = match &err {
        DispatchError::NotFound
        | DispatchError::UnknownTool { .. }
        | DispatchError::UnknownIntegrationType { .. } => StatusCode::NOT_FOUND,
        DispatchError::Inactive | DispatchError::CredentialsMissing => StatusCode::CONFLICT,
        DispatchError::ToolDisabled { .. } => StatusCode::FORBIDDEN,
        DispatchError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::ExecutionFailed { .. } => StatusCode::BAD_GATEWAY,
        DispatchError::DecryptionFailed | DispatchError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            code: "bad_request".into(),
        }),
    )
}

/// Fetch an instance, enforcing tenant isolation: an instance owned by a
/// different organisation is reported as missing.
async fn owned_instance(
    state: &ApiState,
    organisation_id: Uuid,
    instance_id: Uuid,
) -> Result<IntegrationInstance, ApiError> {
    let instance = state
        .store
        .get(instance_id)
        .await
        .map_err(|e| dispatch_error(DispatchError::Storage(e)))?
        .ok_or_else(|| dispatch_error(DispatchError::NotFound))?;
    if instance.organisation_id != organisation_id {
        return Err(dispatch_error(DispatchError::NotFound));
    }
    Ok(instance)
}

/// GET /api/v1/health — Simple health check.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// GET /api/v1/catalog — The machine-readable tool catalog. Public: it
/// contains only static schemas, never tenant data.
pub async fn get_catalog(
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, ApiError> {
    let scope: CatalogScope = query
        .scope
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(|e: anyhow::Error| bad_request(e.to_string()))?;

    match query.format.as_deref().unwrap_or("xml") {
        "xml" => {
            let xml = export::catalog_xml(&state.registry, scope);
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/xml")],
                xml,
            )
                .into_response())
        }
        "json" => Ok(Json(export::catalog_json(&state.registry, scope)).into_response()),
        other => Err(bad_request(format!("unknown catalog format '{other}'"))),
    }
}

/// GET /api/v1/integrations — Integration metadata incl. credential schema.
pub async fn list_integrations(State(state): State<ApiState>) -> Json<Vec<IntegrationView>> {
    let views = state
        .registry
        .all()
        .iter()
        .map(|integration| IntegrationView {
            type_id: integration.type_id().to_string(),
            name: integration.name().to_string(),
            category: match integration.kind() {
                IntegrationKind::Platform => "system",
                IntegrationKind::Personalized => "user",
            },
            requires_credentials: integration.requires_credentials(),
            experimental: integration.is_experimental(),
            setup_instructions: integration.setup_instructions().map(str::to_string),
            credential_fields: integration.credential_fields(),
        })
        .collect();
    Json(views)
}

/// GET /api/v1/instances — The caller organisation's activations.
pub async fn list_instances(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<InstanceView>>, ApiError> {
    let organisation_id = auth::organisation_from_headers(&state, &headers)?;

    let instances = state
        .store
        .list_for_organisation(organisation_id)
        .await
        .map_err(|e| dispatch_error(DispatchError::Storage(e)))?;

    let views = instances
        .into_iter()
        .map(|instance| InstanceView {
            id: instance.id,
            has_credentials: instance.has_credentials(),
            active: instance.active,
            disabled_tools: instance.disabled_tools.iter().cloned().collect(),
            integration_type: instance.integration_type,
        })
        .collect();
    Ok(Json(views))
}

/// PUT /api/v1/instances/{id}/credentials — Validate, encrypt and store
/// credentials for an instance. Validation failures leave the stored
/// ciphertext untouched.
pub async fn put_credentials(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<Value>, ApiError> {
    let organisation_id = auth::organisation_from_headers(&state, &headers)?;
    let instance = owned_instance(&state, organisation_id, id).await?;

    let integration = state.registry.get(&instance.integration_type).ok_or_else(|| {
        dispatch_error(DispatchError::UnknownIntegrationType {
            integration_type: instance.integration_type.clone(),
        })
    })?;

    if !body.credentials.is_object() {
        return Err(bad_request("'credentials' must be a JSON object"));
    }
    let credentials =
        CredentialMap::from_json(&body.credentials.to_string()).map_err(|_| {
            bad_request("'credentials' must be a JSON object")
        })?;

    integration
        .validate_credentials(&credentials)
        .map_err(dispatch_error)?;

    let ciphertext = state.cipher.encrypt(&credentials.to_json()).map_err(|e| {
        tracing::error!(instance = %id, error = %e, "credential encryption failed");
        dispatch_error(DispatchError::Storage(anyhow::anyhow!(
            "failed to encrypt credentials"
        )))
    })?;

    state
        .store
        .set_credentials(id, Some(ciphertext))
        .await
        .map_err(|e| dispatch_error(DispatchError::Storage(e)))?;

    Ok(Json(json!({ "success": true })))
}

/// GET /api/v1/instances/{id}/prompt — The assembled agent prompt fragment
/// for this instance (null for platform integrations).
pub async fn get_prompt(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let organisation_id = auth::organisation_from_headers(&state, &headers)?;
    let instance = owned_instance(&state, organisation_id, id).await?;

    let integration = state.registry.get(&instance.integration_type).ok_or_else(|| {
        dispatch_error(DispatchError::UnknownIntegrationType {
            integration_type: instance.integration_type.clone(),
        })
    })?;

    let prompt = integration.system_prompt(instance.system_prompt_override.as_deref());
    Ok(Json(json!({
        "type": instance.integration_type,
        "prompt": prompt,
    })))
}

/// POST /api/v1/execute — The dispatch path.
pub async fn execute(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ExecuteRequest>,
) -> Result<Json<Value>, ApiError> {
    let organisation_id = auth::organisation_from_headers(&state, &headers)?;

    let payload = state
        .dispatcher
        .dispatch(
            organisation_id,
            body.instance_id,
            &body.tool_name,
            &body.parameters,
        )
        .await
        .map_err(dispatch_error)?;

    // Fold the tool payload into the response envelope.
    let response = match payload {
        Value::Object(mut map) => {
            map.insert("success".into(), Value::Bool(true));
            Value::Object(map)
        }
        other => json!({ "success": true, "result": other }),
    };
    Ok(Json(response))
}
