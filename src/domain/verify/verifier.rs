// Read-only admit/deny decisions from indexer holdings.

use crate::domain::account::{AccountIdentifier, AssetId};
use crate::error::{AccessError, Result};
use crate::infra::algorand::{AccountHolding, IndexerService};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};

/// Interpretation of an indexer holdings answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holding {
    /// At least one unit is held.
    Held(u64),
    /// No holdings row, or an explicit zero amount.
    NotHeld,
    /// The amount could not be read as a non-negative integer.
    Indeterminate(String),
}

impl Holding {
    /// Fail-closed: only a positive integer amount admits.
    pub fn admits(&self) -> bool {
        matches!(self, Holding::Held(n) if *n > 0)
    }
}

/// Classifies the first holdings row the indexer returned.
pub fn classify_holdings(holdings: &[AccountHolding]) -> Holding {
    let Some(first) = holdings.first() else {
        return Holding::NotHeld;
    };
    match parse_amount(&first.amount) {
        Some(0) => Holding::NotHeld,
        Some(n) => Holding::Held(n),
        None => Holding::Indeterminate(format!("unreadable amount {}", first.amount)),
    }
}

fn parse_amount(amount: &JsonValue) -> Option<u64> {
    match amount {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Answers "does this account currently hold this ticket".
#[derive(Clone)]
pub struct VerificationQuery {
    indexer: Arc<dyn IndexerService>,
}

impl VerificationQuery {
    pub fn new(indexer: Arc<dyn IndexerService>) -> Self {
        Self { indexer }
    }

    pub async fn inspect(&self, account: &AccountIdentifier, asset_id: AssetId) -> Result<Holding> {
        let rows = self
            .indexer
            .lookup_account_holding(account, asset_id)
            .await
            .map_err(|e| AccessError::Query(e.to_string()))?;
        let holding = classify_holdings(&rows);
        if let Holding::Indeterminate(reason) = &holding {
            warn!(
                account = %account,
                asset_id = %asset_id,
                %reason,
                "verification indeterminate, denying"
            );
        }
        Ok(holding)
    }

    /// Validates `asset_id` before any lookup, then decides admit/deny.
    pub async fn verify_ownership(
        &self,
        account: &AccountIdentifier,
        asset_id: i64,
    ) -> Result<bool> {
        let asset_id = AssetId::try_from(asset_id)?;
        let admitted = self.inspect(account, asset_id).await?.admits();
        info!(account = %account, asset_id = %asset_id, admitted, "ownership verified");
        Ok(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(amount: JsonValue) -> Vec<AccountHolding> {
        vec![AccountHolding { asset_id: 5, amount }]
    }

    #[test]
    fn empty_and_zero_holdings_deny() {
        assert_eq!(classify_holdings(&[]), Holding::NotHeld);
        assert_eq!(classify_holdings(&row(json!(0))), Holding::NotHeld);
        assert!(!Holding::NotHeld.admits());
    }

    #[test]
    fn positive_integers_admit() {
        assert_eq!(classify_holdings(&row(json!(1))), Holding::Held(1));
        assert_eq!(classify_holdings(&row(json!("3"))), Holding::Held(3));
        assert!(classify_holdings(&row(json!(1))).admits());
    }

    #[test]
    fn malformed_amounts_are_indeterminate_and_deny() {
        let amounts = [
            json!("lots"),
            json!(-1),
            json!(0.5),
            json!(null),
            json!({"n": 1}),
            json!(true),
        ];
        for amount in amounts {
            let holding = classify_holdings(&row(amount));
            assert!(matches!(holding, Holding::Indeterminate(_)));
            assert!(!holding.admits());
        }
    }
}
