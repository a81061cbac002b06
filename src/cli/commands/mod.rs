//! Command implementations, one module per subcommand.

pub mod get;
pub mod init;
pub mod list;
pub mod save;
