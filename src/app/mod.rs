pub mod executor;
pub mod workflow;

pub use executor::{AtomicGroupExecutor, GroupResult, MethodResult, DEFAULT_WAIT_ROUNDS};
pub use workflow::{CampusPass, IdentityRegistration, MintedTicket};
