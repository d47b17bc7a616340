//! Rules command implementation

use anyhow::Result;

use crate::commands::common::print_table;

/// Execute the rules command
pub(crate) async fn execute() -> Result<()> {
    let rows: Vec<Vec<String>> = mig_lint::global()
        .specs()
        .map(|spec| vec![spec.name.to_string(), spec.description.to_string()])
        .collect();
    print_table(&["NAME", "DESCRIPTION"], &rows);
    Ok(())
}
