pub mod backups;
pub mod check;
pub mod presets;
pub mod restore;
pub mod run;
pub mod validate;

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use textfix_core::{job::Job, presets::preset};

/// Which job to act on: a built-in preset or a YAML rules file.
#[derive(Args)]
pub struct JobArgs {
    /// Built-in job name (see `textfix presets`)
    #[arg(required_unless_present = "rules", conflicts_with = "rules")]
    pub preset: Option<String>,

    /// Load the job from a YAML rules file instead
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

impl JobArgs {
    pub fn load(&self) -> anyhow::Result<Job> {
        match (&self.preset, &self.rules) {
            (_, Some(path)) => Job::load(path)
                .with_context(|| format!("failed to load rules from {}", path.display())),
            (Some(name), None) => Ok(preset(name)?),
            (None, None) => anyhow::bail!("pass a preset name or --rules <FILE>"),
        }
    }
}

/// Load the job and resolve the root it runs against.
pub fn resolve(explicit_root: Option<&Path>, args: &JobArgs) -> anyhow::Result<(Job, PathBuf)> {
    let job = args.load()?;
    let root = crate::root::resolve_root(explicit_root);
    Ok((job, root))
}
