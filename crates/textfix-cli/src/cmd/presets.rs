use crate::output::{print_json, Table};
use textfix_core::presets::{preset, PRESETS};

pub fn run(json: bool) -> anyhow::Result<()> {
    let mut rows = Vec::with_capacity(PRESETS.len());
    for (name, summary) in PRESETS {
        let job = preset(name)?;
        rows.push((job, *summary));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(job, summary)| {
                serde_json::json!({
                    "name": job.name,
                    "target": job.target,
                    "backup_prefix": job.backup_prefix,
                    "select": job.filter,
                    "rules": job.rules.all_rules().count(),
                    "summary": summary,
                })
            })
            .collect();
        return print_json(&value);
    }

    let mut table = Table::new(&["NAME", "TARGET", "RULES", "SUMMARY"]);
    for (job, summary) in &rows {
        table.row([
            job.name.clone(),
            job.target.display().to_string(),
            job.rules.all_rules().count().to_string(),
            summary.to_string(),
        ]);
    }
    table.print();
    Ok(())
}
