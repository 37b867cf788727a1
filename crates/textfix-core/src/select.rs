use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How the files of a job are chosen under its target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFilter {
    /// Every file below the root, recursively, with this extension (no dot).
    Extension(String),
    /// A fixed list of paths relative to the root. Missing ones are skipped.
    Explicit(Vec<PathBuf>),
}

/// Resolve `filter` against `root`. The result is ordered deterministically:
/// walk order sorted by file name for `Extension`, declared order for
/// `Explicit`. Symlinked files are selected by the link's own name. A root
/// with no matches (or no root at all) yields an empty list.
pub fn select_files(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    match filter {
        FileFilter::Extension(ext) => {
            let ext = ext.trim_start_matches('.');
            WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(ext))
                .map(|e| e.into_path())
                .collect()
        }
        FileFilter::Explicit(paths) => paths
            .iter()
            .map(|p| root.join(p))
            .filter(|p| p.exists())
            .collect(),
    }
}
