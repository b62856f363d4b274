// Responsible for all communication with the algod REST API.

use crate::domain::transaction::NetworkParams;
use crate::error::LedgerError;
use crate::infra::algorand::service::{LedgerService, PendingTransactionInfo, SignedTransaction};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

const TOKEN_HEADER: &str = "X-Algo-API-Token";
/// Validity window applied to suggested params, matching the SDK default.
const VALIDITY_ROUNDS: u64 = 1000;

#[derive(Deserialize)]
struct ParamsResponse {
    fee: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Deserialize)]
struct PendingResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
    #[serde(rename = "asset-index", default)]
    asset_index: Option<u64>,
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Thin client for an algod node.
#[derive(Clone)]
pub struct AlgodClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl AlgodClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let response = self
            .http
            .get(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    if status == StatusCode::BAD_REQUEST {
        Err(LedgerError::Rejected(message))
    } else {
        Err(LedgerError::Transport(format!("{status}: {message}")))
    }
}

#[async_trait]
impl LedgerService for AlgodClient {
    async fn transaction_params(&self) -> Result<NetworkParams, LedgerError> {
        let raw: ParamsResponse = self.get_json("/v2/transactions/params").await?;
        Ok(NetworkParams {
            fee: raw.fee,
            min_fee: raw.min_fee,
            first_valid: raw.last_round,
            last_valid: raw.last_round + VALIDITY_ROUNDS,
            genesis_id: raw.genesis_id,
            genesis_hash: raw.genesis_hash,
        })
    }

    async fn submit(&self, group: &[SignedTransaction]) -> Result<Vec<String>, LedgerError> {
        let body: Vec<u8> = group.iter().flat_map(|t| t.blob.iter().copied()).collect();
        debug!(transactions = group.len(), bytes = body.len(), "posting signed group");
        let response = self
            .http
            .post(self.url("/v2/transactions"))
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let accepted: SubmitResponse = decode_response(response).await?;

        let ids: Vec<String> = group.iter().map(|t| t.tx_id.clone()).collect();
        if ids.first() != Some(&accepted.tx_id) {
            warn!(node = %accepted.tx_id, "node reported a different first transaction id");
        }
        Ok(ids)
    }

    async fn pending_transaction_info(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransactionInfo, LedgerError> {
        let raw: PendingResponse = self
            .get_json(&format!("/v2/transactions/pending/{tx_id}"))
            .await?;
        let logs = raw
            .logs
            .iter()
            .map(|l| BASE64.decode(l))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Malformed(format!("log is not base64: {e}")))?;
        Ok(PendingTransactionInfo {
            confirmed_round: raw.confirmed_round,
            pool_error: raw.pool_error,
            asset_index: raw.asset_index,
            logs,
        })
    }

    async fn last_round(&self) -> Result<u64, LedgerError> {
        let raw: StatusResponse = self.get_json("/v2/status").await?;
        Ok(raw.last_round)
    }

    async fn wait_for_block_after(&self, round: u64) -> Result<u64, LedgerError> {
        let raw: StatusResponse = self
            .get_json(&format!("/v2/status/wait-for-block-after/{round}"))
            .await?;
        Ok(raw.last_round)
    }
}
