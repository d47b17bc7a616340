//! Reverse command implementation

use anyhow::{Context, Result};
use mig_sql::Reversal;

use crate::cli::{GlobalArgs, ReverseArgs};
use crate::commands::common::terminated;
use crate::context::ProjectContext;

/// Execute the reverse command
pub(crate) async fn execute(args: &ReverseArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let scripts = ctx.scripts(None)?;

    if args.baseline {
        let statements = scripts.baseline_reversal();
        if statements.is_empty() {
            println!("-- no baseline tables");
        }
        for statement in statements {
            println!("{}", terminated(&statement));
        }
        return Ok(());
    }

    let Some(id) = args.script.as_deref() else {
        anyhow::bail!("Name a script as module/filename, or pass --baseline");
    };
    let plan = scripts
        .reversal_plan(id)
        .with_context(|| format!("Failed to compute the reverse of {}", id))?;

    println!("-- Reverse of {}, newest statement first", plan.script);
    for (statement, reversal) in plan.steps.iter().rev() {
        match reversal {
            Reversal::Reversed(sql) => println!("{}", terminated(sql)),
            Reversal::NotReversible(reason) => {
                println!("-- not reversible ({}): {}", reason, first_line(statement))
            }
            Reversal::NoReversal => {}
        }
    }
    Ok(())
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or_default()
}
