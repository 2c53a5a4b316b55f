//! `conductor workers` - list the registered workers.

use crate::cli::output::{list_table, render_list};
use crate::infrastructure::builtin_registry;

pub fn execute(json: bool) -> anyhow::Result<()> {
    let registry = builtin_registry();
    let ids = registry.worker_ids();

    if json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }

    let mut table = list_table(&["worker"]);
    for id in &ids {
        table.add_row(vec![id.clone()]);
    }
    println!("{}", render_list("worker", &table, ids.len()));
    Ok(())
}
