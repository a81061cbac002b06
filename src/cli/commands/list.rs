//! `credvault list`: show records grouped by group, without secrets.

use crate::cli::{open_store, output, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, group: &str) -> Result<()> {
    let (_, store) = open_store(cli)?;
    let groups = store.list_by_group(group)?;
    output::print_groups(&groups);
    Ok(())
}
