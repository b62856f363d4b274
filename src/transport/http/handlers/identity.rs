use crate::crypto::IdentityHash;
use crate::error::AccessError;
use crate::transport::http::types::{
    error_response, json_422, ApiResponse, IdentityHashRequest, IdentityHashResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Lets a kiosk show the value that registration would store, without
/// sending the raw identity anywhere else.
#[utoipa::path(
    post,
    path = "/api/identity-hash",
    request_body = IdentityHashRequest,
    responses(
        (status = 200, description = "SHA-256 hex of the trimmed identity", body = ApiResponse),
        (status = 400, description = "Empty identity", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn identity_hash_handler(
    request: Result<Json<IdentityHashRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"identity\": \"...\"}").into_response(),
    };

    let identity = request.identity.trim();
    if identity.is_empty() {
        return error_response(&AccessError::InvalidIdentity).into_response();
    }

    let hash = IdentityHash::of(identity).to_hex();
    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!(IdentityHashResponse { hash }))),
    )
        .into_response()
}
