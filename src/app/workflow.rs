//! One entry point per user-facing action of the pass system.
//!
//! Every method validates its input and the relevant feature switch before
//! touching the network, fetches fresh network params, builds a single
//! operation, and hands it to the [`AtomicGroupExecutor`].

use crate::app::executor::{AtomicGroupExecutor, GroupResult};
use crate::crypto::{IdentityHash, MetadataDigest};
use crate::domain::abi::AbiValue;
use crate::domain::account::{AccountIdentifier, AppId, AssetId};
use crate::domain::transaction::{
    validate_expiry, TicketMetadata, TransactionBuilder, TransactionGroup, IDENTITY_FEATURE,
    PERMISSION_FEATURE,
};
use crate::domain::verify::VerificationQuery;
use crate::error::{AccessError, Result};
use crate::infra::algorand::{IndexerService, LedgerService, Signer};
use crate::infra::config::CampusPassConfig;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRegistration {
    pub identity_hash: IdentityHash,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedTicket {
    pub asset_id: AssetId,
    pub transaction_id: String,
    pub metadata_digest: MetadataDigest,
}

pub struct CampusPass {
    config: CampusPassConfig,
    ledger: Arc<dyn LedgerService>,
    executor: AtomicGroupExecutor,
    query: VerificationQuery,
    last_minted: Mutex<Option<AssetId>>,
}

impl CampusPass {
    pub fn new(
        config: CampusPassConfig,
        ledger: Arc<dyn LedgerService>,
        indexer: Arc<dyn IndexerService>,
    ) -> Self {
        let executor = AtomicGroupExecutor::new(ledger.clone(), config.confirmation_rounds);
        Self {
            config,
            ledger,
            executor,
            query: VerificationQuery::new(indexer),
            last_minted: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CampusPassConfig {
        &self.config
    }

    pub fn executor(&self) -> &AtomicGroupExecutor {
        &self.executor
    }

    /// Asset id of the most recent successful mint through this instance.
    pub async fn last_minted_asset(&self) -> Option<AssetId> {
        *self.last_minted.lock().await
    }

    fn identity_app(&self) -> Result<AppId> {
        self.config.identity_app_id.ok_or(AccessError::MissingAppId {
            feature: IDENTITY_FEATURE,
        })
    }

    fn permission_app(&self) -> Result<AppId> {
        self.config.permission_app_id.ok_or(AccessError::MissingAppId {
            feature: PERMISSION_FEATURE,
        })
    }

    async fn builder(&self) -> Result<TransactionBuilder> {
        let params = self
            .ledger
            .transaction_params()
            .await
            .map_err(|e| AccessError::Query(e.to_string()))?;
        Ok(TransactionBuilder::new(params))
    }

    pub async fn opt_in_identity(
        &self,
        account: &AccountIdentifier,
        signer: &dyn Signer,
    ) -> Result<GroupResult> {
        let app_id = self.identity_app()?;
        let op = self.builder().await?.build_identity_opt_in(account, Some(app_id))?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        info!(account = %account, tx_id = result.first_tx_id(), "identity opt-in confirmed");
        Ok(result)
    }

    /// Registers `SHA-256(trimmed student id)`; the raw id never leaves this call.
    pub async fn register_identity(
        &self,
        account: &AccountIdentifier,
        student_id: &str,
        signer: &dyn Signer,
    ) -> Result<IdentityRegistration> {
        let app_id = self.identity_app()?;
        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Err(AccessError::InvalidIdentity);
        }
        let identity_hash = IdentityHash::of(student_id);

        let op = self
            .builder()
            .await?
            .build_identity_registration(account, Some(app_id), &identity_hash)?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        info!(account = %account, tx_id = result.first_tx_id(), "identity registered");
        Ok(IdentityRegistration {
            identity_hash,
            transaction_id: result.first_tx_id().to_string(),
        })
    }

    /// Reads the hash registered for `account`; empty when none.
    pub async fn lookup_identity(
        &self,
        caller: &AccountIdentifier,
        account: &AccountIdentifier,
        signer: &dyn Signer,
    ) -> Result<String> {
        let app_id = self.identity_app()?;
        let op = self
            .builder()
            .await?
            .build_identity_lookup(Some(app_id), caller, account)?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        Ok(match result.first_return_value() {
            Some(AbiValue::String(hash)) => hash.clone(),
            _ => String::new(),
        })
    }

    pub async fn mint_ticket(
        &self,
        account: &AccountIdentifier,
        event_name: &str,
        url: &str,
        signer: &dyn Signer,
    ) -> Result<MintedTicket> {
        self.mint_ticket_with(account, TicketMetadata::new(event_name, url), signer)
            .await
    }

    pub async fn mint_ticket_with(
        &self,
        account: &AccountIdentifier,
        metadata: TicketMetadata,
        signer: &dyn Signer,
    ) -> Result<MintedTicket> {
        metadata.validate()?;
        let op = self.builder().await?.build_ticket_mint(account, &metadata)?;
        let group = TransactionGroup::single(op);
        let result = self.executor.execute(&group, signer).await?;
        let asset_id = self.executor.created_asset_id(&group, &result).await?;

        *self.last_minted.lock().await = Some(asset_id);
        info!(account = %account, asset_id = %asset_id, "ticket minted");
        Ok(MintedTicket {
            asset_id,
            transaction_id: result.first_tx_id().to_string(),
            metadata_digest: metadata.digest(),
        })
    }

    pub async fn grant_permission(
        &self,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
        expiry_unix_seconds: i64,
        signer: &dyn Signer,
    ) -> Result<GroupResult> {
        let app_id = self.permission_app()?;
        validate_expiry(expiry_unix_seconds)?;
        let op = self.builder().await?.build_permission_grant(
            Some(app_id),
            caller,
            target,
            expiry_unix_seconds,
        )?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        info!(
            target = %target,
            expiry = expiry_unix_seconds,
            tx_id = result.first_tx_id(),
            "permission granted"
        );
        Ok(result)
    }

    pub async fn revoke_permission(
        &self,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
        signer: &dyn Signer,
    ) -> Result<GroupResult> {
        let app_id = self.permission_app()?;
        let op = self
            .builder()
            .await?
            .build_permission_revoke(Some(app_id), caller, target)?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        info!(target = %target, tx_id = result.first_tx_id(), "permission revoked");
        Ok(result)
    }

    /// Submits `has_permission`; an absent or non-bool answer counts as denied.
    pub async fn check_permission(
        &self,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
        signer: &dyn Signer,
    ) -> Result<bool> {
        let app_id = self.permission_app()?;
        let op = self
            .builder()
            .await?
            .build_permission_check(Some(app_id), caller, target)?;
        let result = self.executor.execute(&TransactionGroup::single(op), signer).await?;
        let allowed = result
            .first_return_value()
            .and_then(AbiValue::as_bool)
            .unwrap_or(false);
        info!(target = %target, allowed, "permission checked");
        Ok(allowed)
    }

    /// Gate decision; falls back to the configured default event asset.
    ///
    /// A caller-supplied id is validated as raw input. The configured default
    /// was validated at load time and is used as is.
    pub async fn verify_entry(
        &self,
        account: &AccountIdentifier,
        asset_id: Option<i64>,
    ) -> Result<bool> {
        if let Some(raw) = asset_id {
            return self.query.verify_ownership(account, raw).await;
        }
        let default = self
            .config
            .default_event_asset_id
            .ok_or(AccessError::MissingAssetId)?;
        let admitted = self.query.inspect(account, default).await?.admits();
        info!(account = %account, asset_id = %default, admitted, "ownership verified");
        Ok(admitted)
    }
}
