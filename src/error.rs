//! Error types for the access-control workflow.
//!
//! Every operation returns [`AccessError`] as a value. Validation variants are
//! raised before any network call; [`LedgerError`] is what the external
//! collaborators (algod, indexer, signer) report and is folded into
//! [`AccessError`] at the workflow boundary.

use thiserror::Error;

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors reported by the external ledger, indexer or signer adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger refused the transaction group (failed assertion, bad
    /// signature, stale params, insufficient balance...).
    #[error("rejected by ledger: {0}")]
    Rejected(String),

    /// The service could not be reached or answered with a non-success status.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The service answered but the payload could not be interpreted.
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

/// Errors surfaced by the access-control workflow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The account identifier failed the address well-formedness check.
    #[error("invalid account address: {0}")]
    InvalidAccount(String),

    /// Asset ids must be positive integers.
    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),

    /// Expiry must be a positive unix timestamp in seconds.
    #[error("invalid expiry timestamp: {0}")]
    InvalidExpiry(i64),

    /// The contract backing `feature` is not configured.
    #[error("{feature} app id is not configured")]
    MissingAppId { feature: &'static str },

    /// No asset id was given and no default event asset is configured.
    #[error("no asset id given and no default event asset configured")]
    MissingAssetId,

    /// The identity string is empty after trimming.
    #[error("identity must not be empty")]
    InvalidIdentity,

    /// Ticket metadata exceeds ledger asset-parameter limits.
    #[error("invalid ticket metadata: {0}")]
    InvalidMetadata(String),

    /// The group is empty or larger than the ledger allows.
    #[error("invalid transaction group: {0}")]
    InvalidGroup(String),

    /// The ledger rejected the group; nothing took effect.
    #[error("submission failed: {reason}")]
    Submission { reason: String },

    /// The group was submitted but not confirmed within the round budget.
    #[error("transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    /// The mint group succeeded but the created asset id could not be resolved.
    #[error("asset creation incomplete: {0}")]
    AssetCreationIncomplete(String),

    /// The external signer refused or failed to sign.
    #[error("signing failed: {0}")]
    Signer(String),

    /// A read against the ledger or indexer failed.
    #[error("ledger query failed: {0}")]
    Query(String),

    /// Configuration value present but unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AccessError {
    /// True for errors raised locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AccessError::InvalidAccount(_)
                | AccessError::InvalidAssetId(_)
                | AccessError::InvalidExpiry(_)
                | AccessError::MissingAppId { .. }
                | AccessError::MissingAssetId
                | AccessError::InvalidIdentity
                | AccessError::InvalidMetadata(_)
                | AccessError::InvalidGroup(_)
        )
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AccessError::InvalidAccount(_) => "Invalid Algorand address".to_string(),
            AccessError::InvalidAssetId(_) => "Enter a valid Asset ID".to_string(),
            AccessError::InvalidExpiry(_) => "Provide unix expiry timestamp".to_string(),
            AccessError::MissingAppId { feature } => format!("{feature} is not enabled"),
            AccessError::MissingAssetId => "Enter a valid Asset ID".to_string(),
            AccessError::InvalidIdentity => "Enter student ID".to_string(),
            AccessError::InvalidMetadata(msg) => format!("Invalid ticket details: {msg}"),
            AccessError::InvalidGroup(_) => "Nothing to submit".to_string(),
            AccessError::Submission { reason } => format!("Transaction rejected: {reason}"),
            AccessError::ConfirmationTimeout { .. } => {
                "Transaction not confirmed yet; check the ledger before retrying".to_string()
            }
            AccessError::AssetCreationIncomplete(_) => {
                "Could not determine created asset ID".to_string()
            }
            AccessError::Signer(_) => "Wallet did not sign the transaction".to_string(),
            AccessError::Query(_) => "Ledger lookup failed".to_string(),
            AccessError::Config(msg) => format!("Configuration error: {msg}"),
        }
    }
}

impl From<LedgerError> for AccessError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(reason) => AccessError::Submission { reason },
            LedgerError::Transport(msg) | LedgerError::Malformed(msg) => AccessError::Query(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_maps_to_submission_with_reason() {
        let err: AccessError = LedgerError::Rejected("logic eval error".into()).into();
        assert_eq!(
            err,
            AccessError::Submission {
                reason: "logic eval error".into()
            }
        );
        assert!(!err.is_validation());
        assert!(err.user_message().contains("logic eval error"));
    }

    #[test]
    fn validation_errors_are_flagged() {
        assert!(AccessError::InvalidExpiry(0).is_validation());
        assert!(AccessError::MissingAppId { feature: "Permissions" }.is_validation());
        assert!(!AccessError::Query("down".into()).is_validation());
    }
}
