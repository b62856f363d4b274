pub mod algorand;
pub mod config;
