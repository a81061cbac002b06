//! Configuration: the `Settings` value every command is built from.

pub mod settings;

pub use settings::{ProviderKind, Settings};
