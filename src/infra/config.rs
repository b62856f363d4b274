//! Centralized configuration (environment variables + defaults).
//!
//! The three contract/asset ids are optional: leaving one unset disables the
//! matching feature. A value that is present but not a positive integer is a
//! configuration error rather than a silently disabled feature.

use crate::domain::account::{AppId, AssetId};
use crate::error::AccessError;
use std::net::SocketAddr;

pub const DEFAULT_ALGOD_SERVER: &str = "https://testnet-api.algonode.cloud";
pub const DEFAULT_INDEXER_SERVER: &str = "https://testnet-idx.algonode.cloud";
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 4;
pub const DEFAULT_GATE_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Which ledger backend the binaries talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    Algod,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampusPassConfig {
    pub identity_app_id: Option<AppId>,
    pub permission_app_id: Option<AppId>,
    pub default_event_asset_id: Option<AssetId>,
    pub algod_server: String,
    pub algod_token: String,
    pub indexer_server: String,
    pub indexer_token: String,
    pub confirmation_rounds: u64,
    pub gate_listen_addr: SocketAddr,
    pub ledger_mode: LedgerMode,
}

impl CampusPassConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, AccessError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AccessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let identity_app_id = optional_id::<AppId>("IDENTITY_APP_ID", get("IDENTITY_APP_ID"))?;
        let permission_app_id =
            optional_id::<AppId>("PERMISSION_APP_ID", get("PERMISSION_APP_ID"))?;
        let default_event_asset_id =
            optional_id::<AssetId>("DEFAULT_EVENT_ASSET_ID", get("DEFAULT_EVENT_ASSET_ID"))?;

        let confirmation_rounds = match get("CONFIRMATION_ROUNDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AccessError::Config("CONFIRMATION_ROUNDS must be a valid u64".into()))?
                .max(1),
            None => DEFAULT_CONFIRMATION_ROUNDS,
        };

        let gate_listen_addr = get("GATE_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_GATE_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AccessError::Config(format!("GATE_LISTEN_ADDR: {e}")))?;

        let ledger_mode = match get("LEDGER_MODE").as_deref() {
            None | Some("algod") => LedgerMode::Algod,
            Some("simulated") => LedgerMode::Simulated,
            Some(other) => {
                return Err(AccessError::Config(format!(
                    "LEDGER_MODE must be 'algod' or 'simulated', got {other:?}"
                )))
            }
        };

        Ok(Self {
            identity_app_id,
            permission_app_id,
            default_event_asset_id,
            algod_server: get("ALGOD_SERVER").unwrap_or_else(|| DEFAULT_ALGOD_SERVER.to_string()),
            algod_token: get("ALGOD_TOKEN").unwrap_or_default(),
            indexer_server: get("INDEXER_SERVER")
                .unwrap_or_else(|| DEFAULT_INDEXER_SERVER.to_string()),
            indexer_token: get("INDEXER_TOKEN").unwrap_or_default(),
            confirmation_rounds,
            gate_listen_addr,
            ledger_mode,
        })
    }

    /// Human-readable list of which optional features are switched on.
    pub fn feature_summary(&self) -> Vec<(&'static str, Option<u64>)> {
        vec![
            ("identity registration", self.identity_app_id.map(|id| id.get())),
            ("permission management", self.permission_app_id.map(|id| id.get())),
            ("default event asset", self.default_event_asset_id.map(|id| id.get())),
        ]
    }
}

fn optional_id<T>(key: &str, raw: Option<String>) -> Result<Option<T>, AccessError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| AccessError::Config(format!("{key} must be a positive integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<CampusPassConfig, AccessError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CampusPassConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn unset_ids_disable_features() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.identity_app_id, None);
        assert_eq!(cfg.permission_app_id, None);
        assert_eq!(cfg.default_event_asset_id, None);
        assert_eq!(cfg.confirmation_rounds, DEFAULT_CONFIRMATION_ROUNDS);
        assert_eq!(cfg.algod_server, DEFAULT_ALGOD_SERVER);
        assert_eq!(cfg.ledger_mode, LedgerMode::Algod);
    }

    #[test]
    fn blank_value_counts_as_unset() {
        let cfg = config(&[("PERMISSION_APP_ID", "  ")]).unwrap();
        assert_eq!(cfg.permission_app_id, None);
    }

    #[test]
    fn ids_must_be_positive_integers() {
        let cfg = config(&[("IDENTITY_APP_ID", "738"), ("DEFAULT_EVENT_ASSET_ID", "42")]).unwrap();
        assert_eq!(cfg.identity_app_id.map(|id| id.get()), Some(738));
        assert_eq!(cfg.default_event_asset_id.map(|id| id.get()), Some(42));

        for bad in ["0", "-3", "12.5", "abc"] {
            assert!(matches!(
                config(&[("IDENTITY_APP_ID", bad)]),
                Err(AccessError::Config(_))
            ));
        }
    }

    #[test]
    fn confirmation_rounds_has_floor_of_one() {
        let cfg = config(&[("CONFIRMATION_ROUNDS", "0")]).unwrap();
        assert_eq!(cfg.confirmation_rounds, 1);
        assert!(config(&[("LEDGER_MODE", "mainnet")]).is_err());
        assert_eq!(
            config(&[("LEDGER_MODE", "simulated")]).unwrap().ledger_mode,
            LedgerMode::Simulated
        );
    }
}
