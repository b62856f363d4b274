pub mod builder;
pub mod types;

pub use builder::{validate_expiry, TransactionBuilder, IDENTITY_FEATURE, PERMISSION_FEATURE};
pub use types::{
    ApplicationCall, AssetCreate, BoxReference, NetworkParams, OnComplete, Operation,
    TicketMetadata, TransactionGroup, TxnHeader, MAX_GROUP_SIZE,
};
