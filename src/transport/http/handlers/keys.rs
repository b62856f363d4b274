use crate::domain::keys::permission_key_for;
use crate::transport::http::types::{error_response, ApiResponse, PermissionKeyResponse};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/permission-key/{account}",
    params(
        ("account" = String, Path, description = "58-character account address")
    ),
    responses(
        (status = 200, description = "Hex of the permission box name", body = ApiResponse),
        (status = 400, description = "Invalid account address", body = ApiResponse)
    )
)]
pub async fn permission_key_handler(Path(account): Path<String>) -> impl IntoResponse {
    match permission_key_for(&account) {
        Ok(key) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!(PermissionKeyResponse {
                key_hex: key.to_hex(),
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
