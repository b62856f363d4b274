pub mod algod;
pub mod indexer;
pub mod service;
pub mod simulated;

pub use algod::AlgodClient;
pub use indexer::IndexerClient;
pub use service::{
    AccountHolding, IndexerService, LedgerService, PendingTransactionInfo, SignedTransaction,
    Signer,
};
pub use simulated::{PermissionState, SimulatedLedger, SimulatedSigner};
