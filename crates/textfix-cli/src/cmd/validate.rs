use crate::output::print_json;

use super::JobArgs;

/// `textfix validate` — report rule warnings. Warnings never fail the command.
pub fn run(args: &JobArgs, json: bool) -> anyhow::Result<()> {
    let job = args.load()?;
    let warnings = job.validate();

    if json {
        return print_json(&serde_json::json!({
            "job": job.name,
            "rules": job.rules.all_rules().count(),
            "warnings": warnings,
        }));
    }

    if warnings.is_empty() {
        println!(
            "Job '{}' is valid ({} rules). No warnings.",
            job.name,
            job.rules.all_rules().count()
        );
    } else {
        for w in &warnings {
            println!("[warning] {}", w.message);
        }
    }
    Ok(())
}
