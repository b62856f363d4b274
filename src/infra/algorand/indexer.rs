// Read-only access to the indexer REST API.

use crate::domain::account::{AccountIdentifier, AssetId};
use crate::error::LedgerError;
use crate::infra::algorand::service::{AccountHolding, IndexerService};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const TOKEN_HEADER: &str = "X-Indexer-API-Token";

#[derive(Deserialize)]
struct AssetsResponse {
    #[serde(default)]
    assets: Vec<AccountHolding>,
}

#[derive(Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Pings `/health`; used by preflight checks.
    pub async fn health(&self) -> Result<(), LedgerError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(LedgerError::Transport(format!("indexer health: {}", response.status())))
        }
    }
}

#[async_trait]
impl IndexerService for IndexerClient {
    async fn lookup_account_holding(
        &self,
        account: &AccountIdentifier,
        asset_id: AssetId,
    ) -> Result<Vec<AccountHolding>, LedgerError> {
        let url = format!("{}/v2/accounts/{}/assets", self.base_url, account);
        let response = self
            .http
            .get(url)
            .query(&[("asset-id", asset_id.get())])
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        // The indexer answers 404 for accounts it has never seen.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "indexer lookup: {}",
                response.status()
            )));
        }
        let body: AssetsResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;
        Ok(body.assets)
    }
}
