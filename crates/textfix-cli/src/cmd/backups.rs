use crate::output::{print_json, Table};
use std::path::Path;
use textfix_core::backup::list_backups;

use super::JobArgs;

pub fn run(root: Option<&Path>, args: &JobArgs, json: bool) -> anyhow::Result<()> {
    let (job, root) = super::resolve(root, args)?;
    let backups = list_backups(&job.target_dir(&root), &job.backup_prefix)?;

    if json {
        return print_json(&backups);
    }
    if backups.is_empty() {
        println!("No backups found for '{}'.", job.name);
        return Ok(());
    }

    let mut table = Table::new(&["BACKUP", "PATH"]);
    for b in &backups {
        let name = b
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.row([name, b.display().to_string()]);
    }
    table.print();
    Ok(())
}
