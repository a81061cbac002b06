//! Vault module: the encrypted credential table.
//!
//! This module provides:
//! - `Record` and the CSV row codec (`record`)
//! - Prefix search and adjacency grouping (`locator`)
//! - The advisory lock guarding read-modify-write (`lock`)
//! - `VaultStore`, which decrypts, appends and atomically re-encrypts (`store`)

pub mod locator;
pub mod lock;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use locator::{find_by_name, list_by_group, RecordGroup};
pub use record::{decode_row, decode_table, encode_record, encode_row, Record, COLUMNS};
pub use store::VaultStore;
