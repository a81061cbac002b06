//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{RecordGroup, COLUMNS};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print each group as a `--- key ---` header followed by a Name/Info table.
///
/// Secrets are never shown.
pub fn print_groups(groups: &[RecordGroup]) {
    if groups.is_empty() {
        info("No matching records.");
        tip("Run `credvault save <NAME>` to add a record.");
        return;
    }

    for group in groups {
        println!();
        println!("--- {} ---", style(&group.key).bold());

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![COLUMNS[0], COLUMNS[4]]);
        for record in &group.records {
            table.add_row(vec![record.name.as_str(), record.info.as_str()]);
        }
        println!("{table}");
    }
}
