use crate::domain::account::AccountIdentifier;
use crate::transport::http::types::{
    error_response, json_422, ApiResponse, AppState, VerifyEntryRequest, VerifyEntryResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/verify-entry",
    request_body = VerifyEntryRequest,
    responses(
        (status = 200, description = "Admit/deny decision", body = ApiResponse),
        (status = 400, description = "Invalid account or asset id", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 502, description = "Indexer lookup failed", body = ApiResponse)
    )
)]
pub async fn verify_entry_handler(
    State(state): State<AppState>,
    request: Result<Json<VerifyEntryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"account\": \"...\", \"asset_id\": 123}").into_response();
        }
    };

    let account = match AccountIdentifier::parse(&request.account) {
        Ok(a) => a,
        Err(e) => return error_response(&e).into_response(),
    };

    match state.pass.verify_entry(&account, request.asset_id).await {
        Ok(admitted) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!(VerifyEntryResponse { admitted }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
