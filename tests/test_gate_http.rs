//! Gate API test: serves the router on an ephemeral port and drives it over HTTP.

use campus_pass::infra::algorand::SimulatedLedger;
use campus_pass::{transport, AccountIdentifier, AssetId, CampusPass, CampusPassConfig};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_gate_http() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = SimulatedLedger::new();
    let holder = AccountIdentifier::from_public_key([7; 32]);
    let outsider = AccountIdentifier::from_public_key([8; 32]);
    let event = AssetId::new(31337).ok_or("asset id")?;
    ledger.override_holding(&holder, event, json!(1)).await;

    let mut config = CampusPassConfig::from_lookup(|_| None)?;
    config.default_event_asset_id = Some(event);
    let app_state = transport::http::AppState {
        pass: Arc::new(CampusPass::new(
            config,
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
        )),
    };
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts if a gate server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // --- HEALTH ---
    let resp = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(resp.status(), 200);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["features"]["default event asset"], 31337);

    // --- VERIFY ENTRY (default asset) ---
    let resp = client
        .post(format!("{}/api/verify-entry", base_url))
        .json(&json!({ "account": holder.as_str() }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["data"]["admitted"], true);

    let resp = client
        .post(format!("{}/api/verify-entry", base_url))
        .json(&json!({ "account": outsider.as_str(), "asset_id": 31337 }))
        .send()
        .await?;
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["data"]["admitted"], false);

    // --- VERIFY ENTRY (validation) ---
    let lookups_before = ledger.lookups().await;
    let resp = client
        .post(format!("{}/api/verify-entry", base_url))
        .json(&json!({ "account": holder.as_str(), "asset_id": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Enter a valid Asset ID");

    let resp = client
        .post(format!("{}/api/verify-entry", base_url))
        .json(&json!({ "account": "NOT-AN-ADDRESS" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    assert_eq!(ledger.lookups().await, lookups_before);

    let resp = client
        .post(format!("{}/api/verify-entry", base_url))
        .header("content-type", "application/json")
        .body("{\"asset_id\": 1}")
        .send()
        .await?;
    assert_eq!(resp.status(), 422);

    // --- IDENTITY HASH ---
    let resp = client
        .post(format!("{}/api/identity-hash", base_url))
        .json(&json!({ "identity": " S12345 " }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["data"]["hash"], campus_pass::digest_hex("S12345"));

    let resp = client
        .post(format!("{}/api/identity-hash", base_url))
        .json(&json!({ "identity": "   " }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    // --- PERMISSION KEY ---
    let resp = client
        .get(format!("{}/api/permission-key/{}", base_url, holder.as_str()))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: JsonValue = resp.json().await?;
    let expected = format!("{}{}", hex::encode(b"perm_"), "07".repeat(32));
    assert_eq!(body["data"]["key_hex"], expected);

    let resp = client
        .get(format!("{}/api/permission-key/{}", base_url, "short"))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    server_handle.abort();
    Ok(())
}
