//! `credvault get`: find a record and deliver its secrets.

use std::io;

use crate::cli::{open_store, output, Cli};
use crate::delivery::{sink, DeliveryChannel, StdinAcknowledger};
use crate::errors::{CredVaultError, Result};

/// Execute the `get` command.
///
/// No match is not an error: the channel prints a notice and we exit 0.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let (settings, store) = open_store(cli)?;

    let record = match store.get(name) {
        Ok(record) => Some(record),
        Err(CredVaultError::RecordNotFound(query)) => {
            tracing::debug!(query = %query, "no record matched");
            None
        }
        Err(e) => return Err(e),
    };

    let mut channel = DeliveryChannel::new(sink::from_settings(&settings), StdinAcknowledger);
    let report = channel.deliver(record.as_ref(), &mut io::stdout().lock())?;

    if report.failed() > 0 {
        output::tip("Set `sink_command` in the config file to deliver through another program.");
    }

    Ok(())
}
