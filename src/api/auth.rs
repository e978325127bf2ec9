// src/api/auth.rs — Bearer-token → organisation resolution

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::api::{types::ErrorResponse, ApiState};

/// Resolve the calling organisation from the bearer token. This stands in
/// for the out-of-scope authentication layer: whatever sits in front of
/// this service must map a caller to exactly one organisation.
pub fn organisation_from_headers(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<Uuid, (StatusCode, Json<ErrorResponse>)> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    for entry in state.org_tokens.iter() {
        if constant_time_eq(token.as_bytes(), entry.token.as_bytes()) {
            return Ok(entry.organisation_id);
        }
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid or missing bearer token".into(),
            code: "unauthorized".into(),
        }),
    ))
}

/// Constant-time byte comparison to prevent timing attacks on token auth.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
