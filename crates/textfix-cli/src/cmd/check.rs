use crate::output::{print_json, Table};
use std::path::Path;
use textfix_core::run::check;

use super::JobArgs;

/// `textfix check` — fail when any selected file still contains a pattern or
/// could not be read.
pub fn run(root: Option<&Path>, args: &JobArgs, json: bool) -> anyhow::Result<()> {
    let (job, root) = super::resolve(root, args)?;
    let report = check(&root, &job);

    if json {
        print_json(&serde_json::json!({
            "job": job.name,
            "files_scanned": report.files_scanned,
            "remaining": report.remaining,
            "unreadable": report.unreadable,
        }))?;
    } else if report.is_clean() {
        println!(
            "No remaining patterns under {} ({} files checked).",
            job.target_dir(&root).display(),
            report.files_scanned
        );
    } else {
        if !report.remaining.is_empty() {
            let mut table = Table::new(&["FILE", "PATTERN", "COUNT"]);
            for r in &report.remaining {
                for (pattern, n) in &r.patterns {
                    table.row([r.path.display().to_string(), pattern.clone(), n.to_string()]);
                }
            }
            table.print();
        }
        for u in &report.unreadable {
            println!("  ✗ Unreadable: {}: {}", u.path.display(), u.error);
        }
    }

    if !report.remaining.is_empty() {
        anyhow::bail!("{} file(s) still contain patterns", report.remaining.len());
    }
    if !report.unreadable.is_empty() {
        anyhow::bail!("{} file(s) could not be read", report.unreadable.len());
    }
    Ok(())
}
