use crate::output::print_json;
use std::path::Path;
use textfix_core::run::{self as engine, FileOutcome, RunOptions, RunReport};

use super::JobArgs;

/// `textfix run` — back up the target, then rewrite the selected files.
///
/// A backup failure aborts before anything is modified. Files that fail to
/// read or write are reported and skipped; they do not fail the command.
pub fn run(root: Option<&Path>, args: &JobArgs, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let (job, root) = super::resolve(root, args)?;

    let opts = RunOptions {
        dry_run,
        now: None,
    };
    let report = engine::run(&root, &job, &opts)?;

    if json {
        return print_json(&report);
    }

    print_report(&report, args);
    Ok(())
}

fn print_report(report: &RunReport, args: &JobArgs) {
    if let Some(backup) = &report.backup {
        println!("Backup created: {} ({} files)", backup.root.display(), backup.files);
    } else {
        println!("Dry run: no backup taken, no files written");
    }
    println!();

    for file in &report.files {
        match &file.outcome {
            FileOutcome::Modified { applied } => {
                let verb = if report.dry_run { "Would fix" } else { "Fixed" };
                println!("  ✓ {verb}: {}", file.path.display());
                for a in applied {
                    println!("    - {} → {} (x{})", a.old, a.new, a.occurrences);
                }
            }
            FileOutcome::Failed { error } => {
                println!("  ✗ Error: {}: {error}", file.path.display());
            }
            FileOutcome::Unchanged => {}
        }
    }

    println!();
    println!("Processing complete.");
    println!("   Files processed: {}", report.files_scanned);
    println!("   Files modified: {}", report.files_modified);
    if report.files_failed > 0 {
        println!("   Files failed: {}", report.files_failed);
    }
    println!("   Total changes: {}", report.total_substitutions);

    if let Some(backup) = &report.backup {
        println!("   Backup location: {}", backup.root.display());
        println!();
        println!("To verify:  textfix check {}", job_ref(args));
        println!(
            "To restore: textfix restore {} --backup {}",
            job_ref(args),
            backup.root.display()
        );
    }
}

fn job_ref(args: &JobArgs) -> String {
    match (&args.rules, &args.preset) {
        (Some(path), _) => format!("--rules {}", path.display()),
        (None, Some(name)) => name.clone(),
        (None, None) => String::new(),
    }
}
