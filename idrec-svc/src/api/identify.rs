//! Identify endpoint
//!
//! POST /identify with `{"email"?, "phoneNumber"?}` returns the consolidated
//! contact for the submitted identifiers.

use axum::{extract::State, Json};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ReconcileError;
use crate::reconcile::ConsolidatedView;
use crate::AppState;

/// Request body for POST /identify
///
/// Both fields are optional. A numeric `phoneNumber` is accepted and kept in
/// its decimal string form; empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub phone_number: Option<String>,
}

/// Response body for POST /identify
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: ConsolidatedView,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// POST /identify
pub async fn identify_contact(
    State(state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ReconcileError> {
    let contact = state
        .reconciler
        .identify(request.email, request.phone_number)
        .await?;

    Ok(Json(IdentifyResponse { contact }))
}
