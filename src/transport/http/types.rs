use crate::app::CampusPass;
use crate::error::AccessError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub pass: Arc<CampusPass>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct VerifyEntryRequest {
    /// 58-character account address presented at the gate.
    pub account: String,
    /// Event asset to check; the configured default is used when omitted.
    #[serde(default)]
    pub asset_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct VerifyEntryResponse {
    pub admitted: bool,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct IdentityHashRequest {
    pub identity: String,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct IdentityHashResponse {
    /// Lowercase hex SHA-256 of the trimmed identity.
    pub hash: String,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct PermissionKeyResponse {
    pub key_hex: String,
}

/// Maps a workflow error onto the gate's status codes: local validation is a
/// client error, anything that reached the network is a bad gateway.
pub fn error_response(err: &AccessError) -> (StatusCode, Json<ApiResponse>) {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(ApiResponse::err(err.user_message())))
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::err(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
