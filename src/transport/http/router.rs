use crate::transport::http::handlers::{health, identity, keys, verify};
use crate::transport::http::types::{
    ApiResponse, IdentityHashRequest, IdentityHashResponse, PermissionKeyResponse,
    VerifyEntryRequest, VerifyEntryResponse,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        verify::verify_entry_handler,
        identity::identity_hash_handler,
        keys::permission_key_handler
    ),
    components(schemas(
        ApiResponse,
        VerifyEntryRequest,
        VerifyEntryResponse,
        IdentityHashRequest,
        IdentityHashResponse,
        PermissionKeyResponse
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/verify-entry", post(verify::verify_entry_handler))
        .route("/api/identity-hash", post(identity::identity_hash_handler))
        .route("/api/permission-key/:account", get(keys::permission_key_handler))
        .with_state(app_state)
}
