//! REST adapter tests: algod and indexer clients against a stub node served
//! on an ephemeral port.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use campus_pass::domain::abi::{return_log, AbiValue, RETURN_LOG_PREFIX};
use campus_pass::infra::algorand::{
    AlgodClient, IndexerClient, IndexerService, LedgerService, SignedTransaction,
};
use campus_pass::{AccountIdentifier, AssetId, LedgerError};
use serde_json::{json, Value as JsonValue};

fn stub_node() -> Router {
    Router::new()
        .route(
            "/v2/transactions",
            post(|| async {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": "overspend" })))
            }),
        )
        .route(
            "/v2/transactions/pending/:tx_id",
            get(|Path(tx_id): Path<String>| async move {
                let log = return_log(&AbiValue::String(format!("hash-of-{tx_id}")));
                Json(json!({
                    "confirmed-round": 5,
                    "asset-index": 77,
                    "logs": [BASE64.encode(b"trace"), BASE64.encode(log)],
                }))
            }),
        )
        .route(
            "/v2/accounts/:account/assets",
            get(|| async {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "no accounts found" })))
            }),
        )
        .route(
            "/broken/v2/status",
            get(|| async {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "catchup" })))
            }),
        )
        .route(
            "/broken/v2/transactions/pending/:tx_id",
            get(|| async { Json(json!({ "confirmed-round": 5, "logs": ["***"] })) }),
        )
        .route(
            "/broken/v2/accounts/:account/assets",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "indexer down") }),
        )
        .route(
            "/held/v2/accounts/:account/assets",
            get(|| async { Json(json!({ "assets": [{ "asset-id": 9, "amount": 1 }] })) }),
        )
}

async fn serve_stub() -> Result<String, Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, stub_node()).await.unwrap();
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

fn signed(tx_id: &str) -> SignedTransaction {
    SignedTransaction {
        tx_id: tx_id.to_string(),
        blob: vec![0x82, 0xa3],
    }
}

#[tokio::test]
async fn algod_bad_request_becomes_rejection() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_stub().await?;
    let algod = AlgodClient::new(base_url, "token");

    let err = algod.submit(&[signed("TX1")]).await.unwrap_err();
    assert_eq!(err, LedgerError::Rejected("overspend".into()));
    Ok(())
}

#[tokio::test]
async fn algod_server_error_is_transport() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_stub().await?;
    let algod = AlgodClient::new(format!("{base_url}/broken/"), "token");

    let err = algod.last_round().await.unwrap_err();
    match err {
        LedgerError::Transport(message) => {
            assert!(message.starts_with("500"), "{message}");
            assert!(message.ends_with("catchup"), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn pending_info_decodes_base64_logs() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_stub().await?;
    let algod = AlgodClient::new(base_url, "token");

    let info = algod.pending_transaction_info("TX9").await?;
    assert!(info.is_confirmed());
    assert_eq!(info.confirmed_round, Some(5));
    assert_eq!(info.asset_index, Some(77));
    assert_eq!(info.logs.len(), 2);
    assert_eq!(info.logs[0], b"trace".to_vec());
    assert!(info.logs[1].starts_with(&RETURN_LOG_PREFIX));
    assert_eq!(info.logs[1], return_log(&AbiValue::String("hash-of-TX9".into())));
    Ok(())
}

#[tokio::test]
async fn undecodable_logs_are_malformed() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_stub().await?;
    let algod = AlgodClient::new(format!("{base_url}/broken"), "token");

    let err = algod.pending_transaction_info("TX9").await.unwrap_err();
    assert!(matches!(err, LedgerError::Malformed(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn indexer_not_found_means_no_holdings() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_stub().await?;
    let account = AccountIdentifier::from_public_key([4; 32]);
    let asset = AssetId::new(9).ok_or("asset id")?;

    let indexer = IndexerClient::new(base_url.clone(), "token");
    assert!(indexer.lookup_account_holding(&account, asset).await?.is_empty());

    let held = IndexerClient::new(format!("{base_url}/held"), "token");
    let rows = held.lookup_account_holding(&account, asset).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].asset_id, 9);
    assert_eq!(rows[0].amount, JsonValue::from(1));

    let broken = IndexerClient::new(format!("{base_url}/broken"), "token");
    let err = broken.lookup_account_holding(&account, asset).await.unwrap_err();
    assert!(matches!(err, LedgerError::Transport(_)), "{err:?}");
    Ok(())
}
