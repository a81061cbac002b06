//! `credvault save`: enter a new record and append it to the vault.

use crate::cli::editor::{DialoguerPrompter, InteractiveEditor};
use crate::cli::{open_store, output, Cli};
use crate::errors::Result;
use crate::vault::Record;

/// Execute the `save` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let (settings, store) = open_store(cli)?;

    let defaults = Record {
        name: name.to_string(),
        group: settings.default_group.clone(),
        ..Record::default()
    };
    let mut editor = InteractiveEditor::new(DialoguerPrompter, &settings.default_group);
    let record = editor.collect_record(&defaults)?;

    let count = store.append_and_save(&record)?;
    output::success(&format!(
        "Saved '{}' to {} ({count} records)",
        record.name,
        store.path().display()
    ));

    Ok(())
}
