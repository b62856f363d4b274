//! Capabilities the workflow consumes from the outside world.
//!
//! The signer, the ledger node and the indexer are passed in explicitly so a
//! deterministic double (see [`super::simulated`]) can stand in for them.

use crate::domain::account::{AccountIdentifier, AssetId};
use crate::domain::transaction::{NetworkParams, TransactionGroup};
use crate::error::LedgerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An operation after signing, ready to be posted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx_id: String,
    /// Wire bytes produced by the signer; opaque to this crate.
    pub blob: Vec<u8>,
}

/// Wallet capability. Never exposes key material.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Signs every operation of `group`, in order, as one atomic group.
    async fn sign(&self, group: &TransactionGroup) -> Result<Vec<SignedTransaction>, LedgerError>;
}

/// What the node reports about a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTransactionInfo {
    pub confirmed_round: Option<u64>,
    /// Non-empty when the transaction was dropped from the pool.
    pub pool_error: String,
    pub asset_index: Option<u64>,
    pub logs: Vec<Vec<u8>>,
}

impl PendingTransactionInfo {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|r| r > 0)
    }
}

#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn transaction_params(&self) -> Result<NetworkParams, LedgerError>;

    /// Posts a signed group; returns the transaction ids in group order.
    async fn submit(&self, group: &[SignedTransaction]) -> Result<Vec<String>, LedgerError>;

    async fn pending_transaction_info(&self, tx_id: &str)
        -> Result<PendingTransactionInfo, LedgerError>;

    async fn last_round(&self) -> Result<u64, LedgerError>;

    /// Blocks until a round after `round` exists; returns the new last round.
    async fn wait_for_block_after(&self, round: u64) -> Result<u64, LedgerError>;
}

/// One row of an account's asset holdings.
///
/// `amount` stays raw JSON so malformed values reach the fail-closed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHolding {
    #[serde(rename = "asset-id", default)]
    pub asset_id: u64,
    #[serde(default)]
    pub amount: JsonValue,
}

#[async_trait]
pub trait IndexerService: Send + Sync {
    /// Holdings of `account` filtered to `asset_id`; empty when none.
    async fn lookup_account_holding(
        &self,
        account: &AccountIdentifier,
        asset_id: AssetId,
    ) -> Result<Vec<AccountHolding>, LedgerError>;
}
