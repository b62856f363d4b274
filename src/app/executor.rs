//! Signs, submits and confirms atomic transaction groups.
//!
//! One `execute` call is one submission: there is no retry here. A timeout
//! means the outcome is unknown, so callers must re-read ledger state before
//! trying again or they risk a duplicate mint or grant.

use crate::domain::abi::{AbiMethod, AbiValue};
use crate::domain::account::AssetId;
use crate::domain::transaction::{Operation, TransactionGroup};
use crate::error::{AccessError, Result};
use crate::infra::algorand::{LedgerService, PendingTransactionInfo, Signer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rounds to wait for confirmation when nothing else is configured.
pub const DEFAULT_WAIT_ROUNDS: u64 = 4;

/// Decoded outcome of one method call in a confirmed group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResult {
    pub tx_id: String,
    pub method: AbiMethod,
    /// `None` for void methods or when no return log was found.
    pub return_value: Option<AbiValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResult {
    pub transaction_ids: Vec<String>,
    /// One entry per method call, in group order.
    pub method_results: Vec<MethodResult>,
    pub confirmed_round: u64,
}

impl GroupResult {
    pub fn first_tx_id(&self) -> &str {
        self.transaction_ids
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn first_return_value(&self) -> Option<&AbiValue> {
        self.method_results
            .first()
            .and_then(|r| r.return_value.as_ref())
    }
}

#[derive(Clone)]
pub struct AtomicGroupExecutor {
    ledger: Arc<dyn LedgerService>,
    wait_rounds: u64,
}

impl AtomicGroupExecutor {
    pub fn new(ledger: Arc<dyn LedgerService>, wait_rounds: u64) -> Self {
        Self {
            ledger,
            wait_rounds: wait_rounds.max(1),
        }
    }

    pub fn wait_rounds(&self) -> u64 {
        self.wait_rounds
    }

    pub async fn execute(
        &self,
        group: &TransactionGroup,
        signer: &dyn Signer,
    ) -> Result<GroupResult> {
        let kinds: Vec<&str> = group.operations().iter().map(Operation::kind).collect();
        debug!(?kinds, "signing group");

        let signed = signer
            .sign(group)
            .await
            .map_err(|e| AccessError::Signer(e.to_string()))?;
        if signed.len() != group.len() {
            return Err(AccessError::Signer(format!(
                "signer returned {} transactions for a group of {}",
                signed.len(),
                group.len()
            )));
        }

        let transaction_ids = self.ledger.submit(&signed).await.map_err(|e| {
            warn!(error = %e, "group rejected");
            AccessError::Submission {
                reason: e.to_string(),
            }
        })?;
        let Some(first) = transaction_ids.first().cloned() else {
            return Err(AccessError::Submission {
                reason: "ledger returned no transaction ids".into(),
            });
        };
        info!(tx_id = %first, transactions = transaction_ids.len(), "group submitted");

        let confirmed = self.wait_for_confirmation(&first).await?;
        let confirmed_round = confirmed.confirmed_round.unwrap_or_default();

        let mut method_results = Vec::new();
        let calls = group.operations().iter().zip(&transaction_ids).enumerate();
        for (position, (op, tx_id)) in calls {
            let Some(method) = op.method() else {
                continue;
            };
            let info = if position == 0 {
                confirmed.clone()
            } else {
                self.ledger.pending_transaction_info(tx_id).await?
            };
            let return_value = match method.decode_return(&info.logs) {
                Ok(value) => value,
                Err(e) => {
                    warn!(tx_id = %tx_id, method = %method, error = %e, "undecodable return value");
                    None
                }
            };
            method_results.push(MethodResult {
                tx_id: tx_id.clone(),
                method: method.clone(),
                return_value,
            });
        }

        info!(tx_id = %first, round = confirmed_round, "group confirmed");
        Ok(GroupResult {
            transaction_ids,
            method_results,
            confirmed_round,
        })
    }

    /// Polls until `tx_id` is confirmed, dropped from the pool, or the round
    /// budget runs out.
    pub async fn wait_for_confirmation(&self, tx_id: &str) -> Result<PendingTransactionInfo> {
        let start = self.ledger.last_round().await?;
        let mut current = start;
        while current < start + self.wait_rounds {
            let info = self.ledger.pending_transaction_info(tx_id).await?;
            if info.is_confirmed() {
                return Ok(info);
            }
            if !info.pool_error.is_empty() {
                return Err(AccessError::Submission {
                    reason: info.pool_error,
                });
            }
            self.ledger.wait_for_block_after(current).await?;
            current += 1;
        }
        warn!(tx_id, rounds = self.wait_rounds, "confirmation timed out");
        Err(AccessError::ConfirmationTimeout {
            tx_id: tx_id.to_string(),
            rounds: self.wait_rounds,
        })
    }

    /// Resolves the asset created by the first asset-creation op of `group`.
    pub async fn created_asset_id(
        &self,
        group: &TransactionGroup,
        result: &GroupResult,
    ) -> Result<AssetId> {
        let position = group
            .operations()
            .iter()
            .position(|op| matches!(op, Operation::AssetCreate(_)))
            .ok_or_else(|| {
                AccessError::AssetCreationIncomplete("group creates no asset".into())
            })?;
        let tx_id = result.transaction_ids.get(position).ok_or_else(|| {
            AccessError::AssetCreationIncomplete("missing transaction id for asset creation".into())
        })?;
        let info = self.ledger.pending_transaction_info(tx_id).await?;
        info.asset_index.and_then(AssetId::new).ok_or_else(|| {
            AccessError::AssetCreationIncomplete(format!("no asset index for {tx_id}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountIdentifier;
    use crate::domain::transaction::{TicketMetadata, TransactionBuilder};
    use crate::infra::algorand::SimulatedLedger;

    fn account(b: u8) -> AccountIdentifier {
        AccountIdentifier::from_public_key([b; 32])
    }

    #[test]
    fn wait_budget_has_floor_of_one_round() {
        let executor = AtomicGroupExecutor::new(Arc::new(SimulatedLedger::new()), 0);
        assert_eq!(executor.wait_rounds(), 1);
    }

    #[test]
    fn empty_result_has_no_first_values() {
        let result = GroupResult {
            transaction_ids: vec![],
            method_results: vec![],
            confirmed_round: 0,
        };
        assert_eq!(result.first_tx_id(), "");
        assert!(result.first_return_value().is_none());
    }

    #[tokio::test]
    async fn mint_group_confirms_and_resolves_asset() {
        let ledger = SimulatedLedger::new();
        let executor = AtomicGroupExecutor::new(Arc::new(ledger.clone()), DEFAULT_WAIT_ROUNDS);
        let params = ledger.transaction_params().await.unwrap();
        let op = TransactionBuilder::new(params)
            .build_ticket_mint(&account(3), &TicketMetadata::with_nonce("Gala", "", 42))
            .unwrap();
        let group = TransactionGroup::single(op);

        let result = executor
            .execute(&group, &ledger.signer_for([account(3)]))
            .await
            .unwrap();
        assert_eq!(result.transaction_ids.len(), 1);
        assert!(result.method_results.is_empty());
        assert_eq!(result.confirmed_round, 2);

        let asset_id = executor.created_asset_id(&group, &result).await.unwrap();
        assert_eq!(ledger.asset(asset_id).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn resubmitting_the_same_group_is_rejected() {
        let ledger = SimulatedLedger::new();
        let executor = AtomicGroupExecutor::new(Arc::new(ledger.clone()), DEFAULT_WAIT_ROUNDS);
        let params = ledger.transaction_params().await.unwrap();
        let op = TransactionBuilder::new(params)
            .build_ticket_mint(&account(3), &TicketMetadata::with_nonce("Gala", "", 42))
            .unwrap();
        let group = TransactionGroup::single(op);
        let signer = ledger.signer_for([account(3)]);

        executor.execute(&group, &signer).await.unwrap();
        let err = executor.execute(&group, &signer).await.unwrap_err();
        assert!(matches!(err, AccessError::Submission { .. }));
    }
}
