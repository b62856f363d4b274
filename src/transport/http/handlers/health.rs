use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gate is up; lists enabled features", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let features: serde_json::Map<String, serde_json::Value> = state
        .pass
        .config()
        .feature_summary()
        .into_iter()
        .map(|(name, id)| (name.to_string(), serde_json::json!(id)))
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({
            "status": "ok",
            "features": features,
        }))),
    )
}
