pub mod verifier;

pub use verifier::{classify_holdings, Holding, VerificationQuery};
