pub mod app;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AtomicGroupExecutor, CampusPass, GroupResult};
pub use crypto::hashing::{digest_hex, IdentityHash, MetadataDigest};
pub use domain::account::{AccountIdentifier, AppId, AssetId};
pub use domain::keys::{permission_key, StorageKey};
pub use domain::transaction::{TransactionBuilder, TransactionGroup};
pub use domain::verify::VerificationQuery;
pub use error::{AccessError, LedgerError};
pub use infra::config::CampusPassConfig;
