mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::JobArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "textfix",
    about = "Back up a directory, then apply literal text replacements to its files",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory containing the job's target (default: current directory)
    #[arg(long, global = true, env = "TEXTFIX_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the target directory and apply the job's replacements
    Run {
        #[command(flatten)]
        job: JobArgs,

        /// Report what would change without taking a backup or writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List files that still contain any of the job's patterns
    Check {
        #[command(flatten)]
        job: JobArgs,
    },

    /// List backups taken for a job, oldest first
    Backups {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Replace the target directory with a backup copy
    Restore {
        #[command(flatten)]
        job: JobArgs,

        /// Backup directory to restore from (default: the latest)
        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Lint a job's rules for ordering and scope mistakes
    Validate {
        #[command(flatten)]
        job: JobArgs,
    },

    /// List built-in jobs
    Presets,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = cli.root.as_deref();

    let result = match cli.command {
        Commands::Run { job, dry_run } => cmd::run::run(root, &job, dry_run, cli.json),
        Commands::Check { job } => cmd::check::run(root, &job, cli.json),
        Commands::Backups { job } => cmd::backups::run(root, &job, cli.json),
        Commands::Restore { job, backup } => {
            cmd::restore::run(root, &job, backup.as_deref(), cli.json)
        }
        Commands::Validate { job } => cmd::validate::run(&job, cli.json),
        Commands::Presets => cmd::presets::run(cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
