//! Unsigned ledger operations and the atomic group that carries them.

use crate::crypto::MetadataDigest;
use crate::domain::abi::{AbiMethod, AbiValue};
use crate::domain::account::{AccountIdentifier, AppId};
use crate::domain::keys::StorageKey;
use crate::error::AccessError;
use serde::{Deserialize, Serialize};

/// Maximum number of transactions the ledger accepts in one atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

const MAX_UNIT_NAME_BYTES: usize = 8;
const MAX_ASSET_NAME_BYTES: usize = 32;
const MAX_URL_BYTES: usize = 96;

/// Suggested parameters served by the ledger; every operation embeds a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub fee: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    /// Base64, exactly as algod serves it.
    pub genesis_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnHeader {
    pub sender: AccountIdentifier,
    pub params: NetworkParams,
}

/// Parameters of a newly created asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreate {
    pub header: TxnHeader,
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: String,
    pub metadata_hash: MetadataDigest,
    pub manager: AccountIdentifier,
    pub reserve: AccountIdentifier,
    pub freeze: AccountIdentifier,
    pub clawback: AccountIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnComplete {
    NoOp,
    OptIn,
}

/// A box the call needs access to; the ledger refuses unreferenced box reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxReference {
    pub app_id: AppId,
    pub name: StorageKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCall {
    pub header: TxnHeader,
    pub app_id: AppId,
    pub on_complete: OnComplete,
    /// `None` for bare calls such as opt-in.
    pub method: Option<AbiMethod>,
    pub args: Vec<AbiValue>,
    pub boxes: Vec<BoxReference>,
}

impl ApplicationCall {
    /// Application arguments as submitted: selector followed by encoded args.
    pub fn app_args(&self) -> Vec<Vec<u8>> {
        let Some(method) = &self.method else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.args.len() + 1);
        out.push(method.selector().to_vec());
        out.extend(self.args.iter().map(AbiValue::encode));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    AssetCreate(AssetCreate),
    ApplicationCall(ApplicationCall),
}

impl Operation {
    pub fn sender(&self) -> &AccountIdentifier {
        match self {
            Operation::AssetCreate(op) => &op.header.sender,
            Operation::ApplicationCall(op) => &op.header.sender,
        }
    }

    pub fn method(&self) -> Option<&AbiMethod> {
        match self {
            Operation::ApplicationCall(call) => call.method.as_ref(),
            Operation::AssetCreate(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AssetCreate(_) => "asset_create",
            Operation::ApplicationCall(call) => match call.on_complete {
                OnComplete::OptIn => "app_opt_in",
                OnComplete::NoOp => "app_call",
            },
        }
    }
}

/// Ordered, immutable set of operations that succeed or fail together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct TransactionGroup {
    operations: Vec<Operation>,
}

impl TryFrom<Vec<Operation>> for TransactionGroup {
    type Error = AccessError;

    fn try_from(operations: Vec<Operation>) -> Result<Self, Self::Error> {
        Self::new(operations)
    }
}

impl From<TransactionGroup> for Vec<Operation> {
    fn from(group: TransactionGroup) -> Self {
        group.operations
    }
}

impl TransactionGroup {
    pub fn new(operations: Vec<Operation>) -> Result<Self, AccessError> {
        if operations.is_empty() {
            return Err(AccessError::InvalidGroup("group has no operations".into()));
        }
        if operations.len() > MAX_GROUP_SIZE {
            return Err(AccessError::InvalidGroup(format!(
                "group has {} operations, limit is {MAX_GROUP_SIZE}",
                operations.len()
            )));
        }
        Ok(Self { operations })
    }

    pub fn single(operation: Operation) -> Self {
        Self {
            operations: vec![operation],
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Descriptive data for a ticket mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMetadata {
    pub event_name: String,
    pub url: String,
    pub unit_name: String,
    /// Creation time in unix milliseconds; keeps digests unique across mints.
    pub nonce_millis: i64,
}

impl TicketMetadata {
    pub const DEFAULT_UNIT_NAME: &'static str = "CPASS";

    /// Stamps the metadata with the current time.
    pub fn new(event_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_nonce(event_name, url, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_nonce(
        event_name: impl Into<String>,
        url: impl Into<String>,
        nonce_millis: i64,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            url: url.into(),
            unit_name: Self::DEFAULT_UNIT_NAME.to_string(),
            nonce_millis,
        }
    }

    pub fn digest(&self) -> MetadataDigest {
        MetadataDigest::compute(&self.event_name, self.nonce_millis)
    }

    /// Checks the ledger's asset-parameter limits.
    pub fn validate(&self) -> Result<(), AccessError> {
        if self.event_name.trim().is_empty() {
            return Err(AccessError::InvalidMetadata("event name must not be empty".into()));
        }
        check_len("unit name", &self.unit_name, MAX_UNIT_NAME_BYTES)?;
        check_len("event name", &self.event_name, MAX_ASSET_NAME_BYTES)?;
        check_len("url", &self.url, MAX_URL_BYTES)
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AccessError> {
    if value.len() > max {
        return Err(AccessError::InvalidMetadata(format!(
            "{field} is {} bytes, limit is {max}",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::AbiMethod;

    fn params() -> NetworkParams {
        NetworkParams {
            fee: 0,
            min_fee: 1000,
            first_valid: 10,
            last_valid: 1010,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=".into(),
        }
    }

    fn call(method: Option<AbiMethod>, args: Vec<AbiValue>) -> ApplicationCall {
        ApplicationCall {
            header: TxnHeader {
                sender: AccountIdentifier::from_public_key([1; 32]),
                params: params(),
            },
            app_id: AppId::new(5).unwrap(),
            on_complete: OnComplete::NoOp,
            method,
            args,
            boxes: vec![],
        }
    }

    #[test]
    fn app_args_start_with_selector() {
        let c = call(Some(AbiMethod::grant()), vec![
            AbiValue::Address(AccountIdentifier::from_public_key([2; 32])),
            AbiValue::Uint64(99),
        ]);
        let args = c.app_args();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], AbiMethod::grant().selector().to_vec());
        assert_eq!(args[1], vec![2; 32]);
        assert_eq!(args[2], 99u64.to_be_bytes().to_vec());
    }

    #[test]
    fn bare_call_has_no_args() {
        assert!(call(None, vec![]).app_args().is_empty());
    }

    #[test]
    fn group_size_is_bounded() {
        assert!(matches!(TransactionGroup::new(vec![]), Err(AccessError::InvalidGroup(_))));
        let op = Operation::ApplicationCall(call(None, vec![]));
        assert!(TransactionGroup::new(vec![op.clone(); MAX_GROUP_SIZE]).is_ok());
        assert!(matches!(
            TransactionGroup::new(vec![op; MAX_GROUP_SIZE + 1]),
            Err(AccessError::InvalidGroup(_))
        ));
    }

    #[test]
    fn operation_serializes_with_kind_tag() {
        let op = Operation::ApplicationCall(call(Some(AbiMethod::revoke()), vec![]));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["kind"], "application_call");
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn deserialized_groups_are_size_checked() {
        let op = Operation::ApplicationCall(call(None, vec![]));
        let group = TransactionGroup::new(vec![op.clone(); 2]).unwrap();
        let json = serde_json::to_value(&group).unwrap();
        assert!(json.is_array());
        let back: TransactionGroup = serde_json::from_value(json).unwrap();
        assert_eq!(back, group);

        assert!(serde_json::from_value::<TransactionGroup>(serde_json::json!([])).is_err());
        let oversized = serde_json::to_value(vec![op; MAX_GROUP_SIZE + 1]).unwrap();
        assert!(serde_json::from_value::<TransactionGroup>(oversized).is_err());
    }
}
