//! Translates workflow intents into fully specified, unsigned operations.
//!
//! Builders are pure: the same inputs and [`NetworkParams`] always produce the
//! same operation. Nothing here signs or submits.

use crate::crypto::IdentityHash;
use crate::domain::abi::{AbiMethod, AbiValue, MAX_STRING_BYTES};
use crate::domain::account::{AccountIdentifier, AppId};
use crate::domain::keys::permission_key;
use crate::domain::transaction::types::{
    ApplicationCall, AssetCreate, BoxReference, NetworkParams, OnComplete, Operation,
    TicketMetadata, TxnHeader,
};
use crate::error::{AccessError, Result};
use tracing::debug;

pub const IDENTITY_FEATURE: &str = "Identity registration";
pub const PERMISSION_FEATURE: &str = "Permission management";

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    params: NetworkParams,
}

impl TransactionBuilder {
    pub fn new(params: NetworkParams) -> Self {
        Self { params }
    }

    fn header(&self, sender: &AccountIdentifier) -> TxnHeader {
        TxnHeader {
            sender: sender.clone(),
            params: self.params.clone(),
        }
    }

    fn method_call(
        &self,
        sender: &AccountIdentifier,
        app_id: AppId,
        method: AbiMethod,
        args: Vec<AbiValue>,
        boxes: Vec<BoxReference>,
    ) -> Result<Operation> {
        debug_assert!(method.accepts(&args), "argument types do not match {method}");
        if let Some(arg) = args.iter().find(|a| !a.is_encodable()) {
            return Err(AccessError::InvalidMetadata(format!(
                "{} argument of {method} exceeds {MAX_STRING_BYTES} bytes",
                arg.abi_type().name()
            )));
        }
        debug!(app_id = %app_id, method = %method, sender = %sender, "built method call");
        Ok(Operation::ApplicationCall(ApplicationCall {
            header: self.header(sender),
            app_id,
            on_complete: OnComplete::NoOp,
            method: Some(method),
            args,
            boxes,
        }))
    }

    /// Bare opt-in to the identity contract; creates the account's local state.
    pub fn build_identity_opt_in(
        &self,
        account: &AccountIdentifier,
        app_id: Option<AppId>,
    ) -> Result<Operation> {
        let app_id = app_id.ok_or(AccessError::MissingAppId {
            feature: IDENTITY_FEATURE,
        })?;
        debug!(app_id = %app_id, sender = %account, "built opt-in");
        Ok(Operation::ApplicationCall(ApplicationCall {
            header: self.header(account),
            app_id,
            on_complete: OnComplete::OptIn,
            method: None,
            args: Vec::new(),
            boxes: Vec::new(),
        }))
    }

    /// `register(string)void` with the hex identity hash as the sole argument.
    pub fn build_identity_registration(
        &self,
        account: &AccountIdentifier,
        app_id: Option<AppId>,
        identity_hash: &IdentityHash,
    ) -> Result<Operation> {
        let app_id = app_id.ok_or(AccessError::MissingAppId {
            feature: IDENTITY_FEATURE,
        })?;
        self.method_call(
            account,
            app_id,
            AbiMethod::register(),
            vec![AbiValue::String(identity_hash.to_hex())],
            Vec::new(),
        )
    }

    /// `get_registered_hash(address)string`, read back through a submitted call.
    pub fn build_identity_lookup(
        &self,
        app_id: Option<AppId>,
        caller: &AccountIdentifier,
        account: &AccountIdentifier,
    ) -> Result<Operation> {
        let app_id = app_id.ok_or(AccessError::MissingAppId {
            feature: IDENTITY_FEATURE,
        })?;
        self.method_call(
            caller,
            app_id,
            AbiMethod::get_registered_hash(),
            vec![AbiValue::Address(account.clone())],
            Vec::new(),
        )
    }

    /// One-of-one, creator-controlled ticket asset.
    pub fn build_ticket_mint(
        &self,
        account: &AccountIdentifier,
        metadata: &TicketMetadata,
    ) -> Result<Operation> {
        metadata.validate()?;

        let digest = metadata.digest();
        debug!(
            sender = %account,
            event = %metadata.event_name,
            digest = %digest,
            "built ticket mint"
        );
        Ok(Operation::AssetCreate(AssetCreate {
            header: self.header(account),
            total: 1,
            decimals: 0,
            default_frozen: false,
            unit_name: metadata.unit_name.clone(),
            asset_name: metadata.event_name.clone(),
            url: metadata.url.clone(),
            metadata_hash: digest,
            manager: account.clone(),
            reserve: account.clone(),
            freeze: account.clone(),
            clawback: account.clone(),
        }))
    }

    pub fn build_permission_grant(
        &self,
        app_id: Option<AppId>,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
        expiry_unix_seconds: i64,
    ) -> Result<Operation> {
        let app_id = permission_app(app_id)?;
        let expiry = validate_expiry(expiry_unix_seconds)?;
        self.method_call(
            caller,
            app_id,
            AbiMethod::grant(),
            vec![AbiValue::Address(target.clone()), AbiValue::Uint64(expiry)],
            permission_box(app_id, target),
        )
    }

    pub fn build_permission_revoke(
        &self,
        app_id: Option<AppId>,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
    ) -> Result<Operation> {
        let app_id = permission_app(app_id)?;
        self.method_call(
            caller,
            app_id,
            AbiMethod::revoke(),
            vec![AbiValue::Address(target.clone())],
            permission_box(app_id, target),
        )
    }

    /// `has_permission(address)bool`; the contract only answers through a
    /// submitted call, so this is a transaction like the others.
    pub fn build_permission_check(
        &self,
        app_id: Option<AppId>,
        caller: &AccountIdentifier,
        target: &AccountIdentifier,
    ) -> Result<Operation> {
        let app_id = permission_app(app_id)?;
        self.method_call(
            caller,
            app_id,
            AbiMethod::has_permission(),
            vec![AbiValue::Address(target.clone())],
            permission_box(app_id, target),
        )
    }
}

fn permission_app(app_id: Option<AppId>) -> Result<AppId> {
    app_id.ok_or(AccessError::MissingAppId {
        feature: PERMISSION_FEATURE,
    })
}

fn permission_box(app_id: AppId, target: &AccountIdentifier) -> Vec<BoxReference> {
    vec![BoxReference {
        app_id,
        name: permission_key(target),
    }]
}

/// Expiry must be a positive unix timestamp in seconds.
pub fn validate_expiry(expiry_unix_seconds: i64) -> Result<u64> {
    u64::try_from(expiry_unix_seconds)
        .ok()
        .filter(|e| *e > 0)
        .ok_or(AccessError::InvalidExpiry(expiry_unix_seconds))
}
