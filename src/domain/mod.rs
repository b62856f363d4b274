pub mod abi;
pub mod account;
pub mod keys;
pub mod transaction;
pub mod verify;
