use std::path::{Path, PathBuf};

/// Resolve the directory a job's target is relative to.
///
/// `--root` / `TEXTFIX_ROOT` wins; otherwise the current directory. There is
/// no upward search, so a job never rewrites a tree outside the directory the
/// operator named or stands in.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
