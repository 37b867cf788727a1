use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use textfix_core::backup::{list_backups, restore};
use textfix_core::TextfixError;

use super::JobArgs;

/// `textfix restore` — put a backup copy back in place of the target directory.
pub fn run(
    root: Option<&Path>,
    args: &JobArgs,
    backup: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let (job, root) = super::resolve(root, args)?;
    let target = job.target_dir(&root);

    let source = match backup {
        Some(b) => b.to_path_buf(),
        None => list_backups(&target, &job.backup_prefix)?
            .pop()
            .ok_or_else(|| TextfixError::NoBackups(job.backup_prefix.clone()))?,
    };

    let files = restore(&source, &target)
        .with_context(|| format!("failed to restore from {}", source.display()))?;

    if json {
        print_json(&serde_json::json!({
            "backup": source,
            "target": target,
            "files": files,
        }))?;
    } else {
        println!(
            "Restored {} from {} ({files} files)",
            target.display(),
            source.display()
        );
    }
    Ok(())
}
