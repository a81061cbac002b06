pub mod cli;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod errors;
pub mod process;
pub mod vault;
