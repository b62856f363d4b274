//! In-memory ledger for tests and local dry runs.
//!
//! Models the parts of the network this crate talks to: suggested params,
//! atomic group submission, pending-transaction lookups, round progression,
//! asset holdings, and the identity and permission contracts. Groups are
//! applied to a scratch copy of the state and only committed when every
//! operation succeeds.

use crate::crypto::sha512_256;
use crate::domain::abi::{return_log, AbiMethod, AbiValue};
use crate::domain::account::{AccountIdentifier, AppId, AssetId};
use crate::domain::keys::{permission_key, StorageKey};
use crate::domain::transaction::{
    ApplicationCall, AssetCreate, NetworkParams, OnComplete, Operation, TransactionGroup,
};
use crate::error::LedgerError;
use crate::infra::algorand::service::{
    AccountHolding, IndexerService, LedgerService, PendingTransactionInfo, SignedTransaction,
    Signer,
};
use async_trait::async_trait;
use data_encoding::BASE32_NOPAD;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const GENESIS_ID: &str = "simnet-v1";
const GENESIS_HASH: &str = "c2ltdWxhdGVkLWxlZGdlci1nZW5lc2lzLWhhc2gtMDA=";
const MIN_FEE: u64 = 1000;
const VALIDITY_ROUNDS: u64 = 1000;
const FIRST_INDEX: u64 = 1001;
const DEFAULT_TIMESTAMP: i64 = 1_700_000_000;

type PublicKey = [u8; 32];

/// Lifecycle of one account's permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    NoRecord,
    Active { expiry: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContractKind {
    Identity,
    Permission,
}

#[derive(Debug, Clone)]
struct DeployedApp {
    kind: ContractKind,
    creator: PublicKey,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    round: u64,
    timestamp: i64,
    next_index: u64,
    apps: HashMap<u64, DeployedApp>,
    assets: HashMap<u64, AssetCreate>,
    holdings: HashMap<(PublicKey, u64), u64>,
    opted_in: HashSet<(u64, PublicKey)>,
    student_hash: HashMap<(u64, PublicKey), String>,
    boxes: HashMap<(u64, Vec<u8>), u64>,
    transactions: HashMap<String, PendingTransactionInfo>,
}

#[derive(Debug, Default)]
struct Controls {
    reject_next: Option<String>,
    stall: bool,
    holding_overrides: HashMap<(PublicKey, u64), JsonValue>,
    submissions: usize,
    lookups: usize,
    params_requests: usize,
}

#[derive(Debug)]
struct Inner {
    state: LedgerState,
    controls: Controls,
}

/// Shared handle to one simulated network; clones see the same state.
#[derive(Clone)]
pub struct SimulatedLedger {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    pub fn new() -> Self {
        let state = LedgerState {
            round: 1,
            timestamp: DEFAULT_TIMESTAMP,
            next_index: FIRST_INDEX,
            ..LedgerState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                controls: Controls::default(),
            })),
        }
    }

    async fn deploy(&self, kind: ContractKind, creator: &AccountIdentifier) -> AppId {
        let mut inner = self.inner.lock().await;
        let index = inner.state.next_index;
        inner.state.next_index += 1;
        inner.state.apps.insert(
            index,
            DeployedApp {
                kind,
                creator: *creator.public_key(),
            },
        );
        info!(app_id = index, ?kind, creator = %creator, "simulated contract deployed");
        AppId::new(index).expect("simulated indices start above zero")
    }

    pub async fn deploy_identity_app(&self, creator: &AccountIdentifier) -> AppId {
        self.deploy(ContractKind::Identity, creator).await
    }

    pub async fn deploy_permission_app(&self, creator: &AccountIdentifier) -> AppId {
        self.deploy(ContractKind::Permission, creator).await
    }

    /// Latest block timestamp (unix seconds) seen by contracts.
    pub async fn set_timestamp(&self, unix_seconds: i64) {
        self.inner.lock().await.state.timestamp = unix_seconds;
    }

    /// The next submission fails as if the ledger refused it.
    pub async fn reject_next_submission(&self, reason: impl Into<String>) {
        self.inner.lock().await.controls.reject_next = Some(reason.into());
    }

    /// While stalled, submitted groups sit in the pool and never confirm.
    pub async fn stall_confirmations(&self, stall: bool) {
        self.inner.lock().await.controls.stall = stall;
    }

    /// Makes the indexer report `amount` verbatim for this holding.
    pub async fn override_holding(
        &self,
        account: &AccountIdentifier,
        asset_id: AssetId,
        amount: JsonValue,
    ) {
        self.inner
            .lock()
            .await
            .controls
            .holding_overrides
            .insert((*account.public_key(), asset_id.get()), amount);
    }

    /// Moves one unit of `asset_id` between accounts, outside any workflow.
    pub async fn transfer_asset(
        &self,
        from: &AccountIdentifier,
        to: &AccountIdentifier,
        asset_id: AssetId,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().await;
        let holdings = &mut inner.state.holdings;
        let from_key = (*from.public_key(), asset_id.get());
        match holdings.get_mut(&from_key) {
            Some(amount) if *amount > 0 => *amount -= 1,
            _ => return Err(LedgerError::Rejected("underflow on asset transfer".into())),
        }
        *holdings.entry((*to.public_key(), asset_id.get())).or_insert(0) += 1;
        Ok(())
    }

    pub async fn permission_state(
        &self,
        app_id: AppId,
        account: &AccountIdentifier,
    ) -> PermissionState {
        let inner = self.inner.lock().await;
        let key = permission_key(account);
        match inner.state.boxes.get(&(app_id.get(), key.as_bytes().to_vec())) {
            Some(expiry) => PermissionState::Active { expiry: *expiry },
            None => PermissionState::NoRecord,
        }
    }

    pub async fn registered_hash(
        &self,
        app_id: AppId,
        account: &AccountIdentifier,
    ) -> Option<String> {
        let inner = self.inner.lock().await;
        inner
            .state
            .student_hash
            .get(&(app_id.get(), *account.public_key()))
            .cloned()
    }

    pub async fn asset(&self, asset_id: AssetId) -> Option<AssetCreate> {
        self.inner.lock().await.state.assets.get(&asset_id.get()).cloned()
    }

    /// Number of groups that reached `submit`, accepted or not.
    pub async fn submissions(&self) -> usize {
        self.inner.lock().await.controls.submissions
    }

    /// Number of suggested-params requests served.
    pub async fn params_requests(&self) -> usize {
        self.inner.lock().await.controls.params_requests
    }

    /// Number of indexer holding lookups served.
    pub async fn lookups(&self) -> usize {
        self.inner.lock().await.controls.lookups
    }

    pub fn signer_for(
        &self,
        accounts: impl IntoIterator<Item = AccountIdentifier>,
    ) -> SimulatedSigner {
        SimulatedSigner {
            keys: accounts.into_iter().map(|a| *a.public_key()).collect(),
        }
    }
}

impl LedgerState {
    fn params(&self) -> NetworkParams {
        NetworkParams {
            fee: 0,
            min_fee: MIN_FEE,
            first_valid: self.round,
            last_valid: self.round + VALIDITY_ROUNDS,
            genesis_id: GENESIS_ID.to_string(),
            genesis_hash: GENESIS_HASH.to_string(),
        }
    }

    fn apply(&mut self, op: &Operation) -> Result<PendingTransactionInfo, String> {
        let params = match op {
            Operation::AssetCreate(a) => &a.header.params,
            Operation::ApplicationCall(c) => &c.header.params,
        };
        if params.genesis_id != GENESIS_ID {
            return Err(format!("wrong genesis id {}", params.genesis_id));
        }
        if self.round + 1 < params.first_valid || self.round + 1 > params.last_valid {
            return Err(format!(
                "txn dead: round {} outside [{}, {}]",
                self.round + 1,
                params.first_valid,
                params.last_valid
            ));
        }
        match op {
            Operation::AssetCreate(asset) => Ok(self.create_asset(asset)),
            Operation::ApplicationCall(call) => self.call_app(call),
        }
    }

    fn create_asset(&mut self, asset: &AssetCreate) -> PendingTransactionInfo {
        let index = self.next_index;
        self.next_index += 1;
        self.assets.insert(index, asset.clone());
        self.holdings
            .insert((*asset.header.sender.public_key(), index), asset.total);
        PendingTransactionInfo {
            asset_index: Some(index),
            ..PendingTransactionInfo::default()
        }
    }

    fn call_app(&mut self, call: &ApplicationCall) -> Result<PendingTransactionInfo, String> {
        let app_index = call.app_id.get();
        let app = self
            .apps
            .get(&app_index)
            .cloned()
            .ok_or_else(|| format!("application {app_index} does not exist"))?;
        let sender = *call.header.sender.public_key();

        if call.on_complete == OnComplete::OptIn {
            if !self.opted_in.insert((app_index, sender)) {
                return Err(format!("account has already opted in to app {app_index}"));
            }
            if app.kind == ContractKind::Identity {
                self.student_hash.insert((app_index, sender), String::new());
            }
            return Ok(PendingTransactionInfo::default());
        }

        let (method, args) = decode_call(&app.kind, &call.app_args())?;
        let mut logs = Vec::new();
        match (app.kind, method.name.as_str(), args.as_slice()) {
            (ContractKind::Identity, "register", [AbiValue::String(hash)]) => {
                if !self.opted_in.contains(&(app_index, sender)) {
                    return Err(format!("account has not opted in to app {app_index}"));
                }
                self.student_hash.insert((app_index, sender), hash.clone());
            }
            (ContractKind::Identity, "get_registered_hash", [AbiValue::Address(account)]) => {
                let hash = self
                    .student_hash
                    .get(&(app_index, *account.public_key()))
                    .cloned()
                    .unwrap_or_default();
                logs.push(return_log(&AbiValue::String(hash)));
            }
            (
                ContractKind::Permission,
                "grant",
                [AbiValue::Address(target), AbiValue::Uint64(expiry)],
            ) => {
                require_creator(&app, sender)?;
                let key = require_box(call, target)?;
                self.boxes.insert((app_index, key.as_bytes().to_vec()), *expiry);
            }
            (ContractKind::Permission, "revoke", [AbiValue::Address(target)]) => {
                require_creator(&app, sender)?;
                let key = require_box(call, target)?;
                if self.boxes.remove(&(app_index, key.as_bytes().to_vec())).is_none() {
                    return Err("box does not exist".to_string());
                }
            }
            (ContractKind::Permission, "has_permission", [AbiValue::Address(target)]) => {
                let key = require_box(call, target)?;
                let expiry = self
                    .boxes
                    .get(&(app_index, key.as_bytes().to_vec()))
                    .copied()
                    .unwrap_or(0);
                let now = u64::try_from(self.timestamp).unwrap_or(0);
                logs.push(return_log(&AbiValue::Bool(expiry >= now)));
            }
            _ => return Err(format!("unsupported call {method}")),
        }
        Ok(PendingTransactionInfo {
            logs,
            ..PendingTransactionInfo::default()
        })
    }
}

fn contract_methods(kind: &ContractKind) -> Vec<AbiMethod> {
    match kind {
        ContractKind::Identity => vec![AbiMethod::register(), AbiMethod::get_registered_hash()],
        ContractKind::Permission => vec![
            AbiMethod::grant(),
            AbiMethod::revoke(),
            AbiMethod::has_permission(),
        ],
    }
}

/// Routes on the selector and decodes arguments from their wire bytes, the
/// way the deployed contract sees them.
fn decode_call(
    kind: &ContractKind,
    app_args: &[Vec<u8>],
) -> Result<(AbiMethod, Vec<AbiValue>), String> {
    let (selector, encoded) = app_args
        .split_first()
        .ok_or_else(|| "missing method selector".to_string())?;
    let method = contract_methods(kind)
        .into_iter()
        .find(|m| m.selector().as_slice() == selector.as_slice())
        .ok_or_else(|| format!("no method matches selector {}", hex::encode(selector)))?;
    if encoded.len() != method.args.len() {
        return Err(format!("{method} expects {} args", method.args.len()));
    }
    let args = method
        .args
        .iter()
        .zip(encoded)
        .map(|(ty, bytes)| match AbiValue::decode(*ty, bytes) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err("void argument".to_string()),
            Err(e) => Err(e.to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((method, args))
}

fn require_creator(app: &DeployedApp, sender: PublicKey) -> Result<(), String> {
    if app.creator != sender {
        return Err("assert failed: sender is not the app creator".to_string());
    }
    Ok(())
}

/// The contract keys its box map as `perm_ || address`; the call must
/// reference exactly that box.
fn require_box(call: &ApplicationCall, target: &AccountIdentifier) -> Result<StorageKey, String> {
    let expected = permission_key(target);
    let referenced = call
        .boxes
        .iter()
        .any(|b| b.app_id == call.app_id && b.name == expected);
    if !referenced {
        return Err(format!("invalid box reference {}", expected.to_hex()));
    }
    Ok(expected)
}

#[async_trait]
impl LedgerService for SimulatedLedger {
    async fn transaction_params(&self) -> Result<NetworkParams, LedgerError> {
        let mut inner = self.inner.lock().await;
        inner.controls.params_requests += 1;
        Ok(inner.state.params())
    }

    async fn submit(&self, group: &[SignedTransaction]) -> Result<Vec<String>, LedgerError> {
        let mut inner = self.inner.lock().await;
        inner.controls.submissions += 1;
        if let Some(reason) = inner.controls.reject_next.take() {
            warn!(%reason, "simulated rejection");
            return Err(LedgerError::Rejected(reason));
        }

        let ops = group
            .iter()
            .map(|t| serde_json::from_slice::<Operation>(&t.blob))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Rejected(format!("undecodable transaction: {e}")))?;

        for t in group {
            if inner.state.transactions.contains_key(&t.tx_id) {
                return Err(LedgerError::Rejected(format!(
                    "transaction already in ledger: {}",
                    t.tx_id
                )));
            }
        }

        let mut scratch = inner.state.clone();
        let mut results = Vec::with_capacity(ops.len());
        for (position, op) in ops.iter().enumerate() {
            let result = scratch.apply(op).map_err(|reason| {
                LedgerError::Rejected(format!("transaction {position} rejected: {reason}"))
            })?;
            results.push(result);
        }

        let stalled = inner.controls.stall;
        if stalled {
            // Accepted into the pool but never included.
            for t in group {
                inner
                    .state
                    .transactions
                    .insert(t.tx_id.clone(), PendingTransactionInfo::default());
            }
        } else {
            scratch.round += 1;
            let round = scratch.round;
            for (t, mut info) in group.iter().zip(results) {
                info.confirmed_round = Some(round);
                scratch.transactions.insert(t.tx_id.clone(), info);
            }
            inner.state = scratch;
        }
        debug!(transactions = group.len(), stalled, "simulated group accepted");
        Ok(group.iter().map(|t| t.tx_id.clone()).collect())
    }

    async fn pending_transaction_info(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransactionInfo, LedgerError> {
        self.inner
            .lock()
            .await
            .state
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::Transport(format!("transaction {tx_id} not found")))
    }

    async fn last_round(&self) -> Result<u64, LedgerError> {
        Ok(self.inner.lock().await.state.round)
    }

    async fn wait_for_block_after(&self, round: u64) -> Result<u64, LedgerError> {
        let mut inner = self.inner.lock().await;
        if inner.state.round <= round {
            inner.state.round = round + 1;
        }
        Ok(inner.state.round)
    }
}

#[async_trait]
impl IndexerService for SimulatedLedger {
    async fn lookup_account_holding(
        &self,
        account: &AccountIdentifier,
        asset_id: AssetId,
    ) -> Result<Vec<AccountHolding>, LedgerError> {
        let mut inner = self.inner.lock().await;
        inner.controls.lookups += 1;
        let key = (*account.public_key(), asset_id.get());
        if let Some(amount) = inner.controls.holding_overrides.get(&key) {
            return Ok(vec![AccountHolding {
                asset_id: asset_id.get(),
                amount: amount.clone(),
            }]);
        }
        Ok(inner
            .state
            .holdings
            .get(&key)
            .map(|amount| AccountHolding {
                asset_id: asset_id.get(),
                amount: JsonValue::from(*amount),
            })
            .into_iter()
            .collect())
    }
}

/// Wallet double holding the keys of a fixed set of accounts.
///
/// Blobs are the JSON form of each operation; ids follow the ledger's
/// `base32(sha512_256("TX" || bytes))` shape.
#[derive(Debug, Clone)]
pub struct SimulatedSigner {
    keys: HashSet<PublicKey>,
}

#[async_trait]
impl Signer for SimulatedSigner {
    async fn sign(&self, group: &TransactionGroup) -> Result<Vec<SignedTransaction>, LedgerError> {
        group
            .operations()
            .iter()
            .map(|op| {
                if !self.keys.contains(op.sender().public_key()) {
                    return Err(LedgerError::Rejected(format!(
                        "no key for sender {}",
                        op.sender()
                    )));
                }
                let blob =
                    serde_json::to_vec(op).map_err(|e| LedgerError::Malformed(e.to_string()))?;
                let mut preimage = b"TX".to_vec();
                preimage.extend_from_slice(&blob);
                Ok(SignedTransaction {
                    tx_id: BASE32_NOPAD.encode(&sha512_256(&preimage)),
                    blob,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(b: u8) -> AccountIdentifier {
        AccountIdentifier::from_public_key([b; 32])
    }

    #[tokio::test]
    async fn params_track_the_current_round() {
        let ledger = SimulatedLedger::new();
        let before = ledger.transaction_params().await.unwrap();
        assert_eq!(before.first_valid, 1);
        ledger.wait_for_block_after(1).await.unwrap();
        let after = ledger.transaction_params().await.unwrap();
        assert_eq!(after.first_valid, 2);
        assert_eq!(after.last_valid, 2 + VALIDITY_ROUNDS);
    }

    #[tokio::test]
    async fn signer_refuses_foreign_senders() {
        let ledger = SimulatedLedger::new();
        let params = ledger.transaction_params().await.unwrap();
        let op = crate::domain::transaction::TransactionBuilder::new(params)
            .build_ticket_mint(
                &account(1),
                &crate::domain::transaction::TicketMetadata::with_nonce("Gala", "u", 1),
            )
            .unwrap();
        let err = ledger
            .signer_for([account(2)])
            .sign(&TransactionGroup::single(op))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[tokio::test]
    async fn indexer_reports_empty_for_unknown_holdings() {
        let ledger = SimulatedLedger::new();
        let rows = ledger
            .lookup_account_holding(&account(1), AssetId::new(77).unwrap())
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(ledger.lookups().await, 1);
    }
}
