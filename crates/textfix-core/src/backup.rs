//! Pre-mutation snapshots of a target directory.
//!
//! A snapshot of `<parent>/commands` taken with prefix `.command-path-backups`
//! lands at `<parent>/.command-path-backups-20250101-120000/commands`. The
//! timestamp format sorts lexically, so listing backups by name lists them
//! oldest first.

use crate::error::{Result, TextfixError};
use crate::io::copy_dir_all;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSnapshot {
    /// The timestamped backup directory.
    pub root: PathBuf,
    /// The copy of the source directory inside `root`.
    pub copy: PathBuf,
    pub created_at: NaiveDateTime,
    pub files: usize,
}

/// Directory that holds the backup root: the source's parent.
fn backup_parent(source: &Path) -> &Path {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn source_name(source: &Path) -> Result<&std::ffi::OsStr> {
    source
        .file_name()
        .ok_or_else(|| TextfixError::BackupSourceMissing(source.to_path_buf()))
}

pub fn backup_dir_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix}-{}", at.format(TIMESTAMP_FORMAT))
}

/// Snapshot `source` using the current local time.
pub fn snapshot(source: &Path, prefix: &str) -> Result<BackupSnapshot> {
    snapshot_at(source, prefix, Local::now().naive_local())
}

/// Snapshot `source` as of `at`. Fails without writing anything when the
/// source is missing or the destination already exists. A copy that fails
/// partway is left on disk.
pub fn snapshot_at(source: &Path, prefix: &str, at: NaiveDateTime) -> Result<BackupSnapshot> {
    if !source.is_dir() {
        return Err(TextfixError::BackupSourceMissing(source.to_path_buf()));
    }
    let name = source_name(source)?;
    let root = backup_parent(source).join(backup_dir_name(prefix, at));
    if root.exists() {
        return Err(TextfixError::BackupExists(root));
    }

    let copy = root.join(name);
    let files = copy_dir_all(source, &copy)
        .map_err(|(path, err)| TextfixError::BackupCopy { path, source: err })?;

    tracing::info!(backup = %root.display(), files, "created backup");
    Ok(BackupSnapshot {
        root,
        copy,
        created_at: at,
        files,
    })
}

/// Backups of `source` taken with `prefix`, oldest first.
pub fn list_backups(source: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let parent = backup_parent(source);
    if !parent.is_dir() {
        return Ok(Vec::new());
    }
    let name = source_name(source)?;
    let lead = format!("{prefix}-");

    let mut found = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(stem) = file_name.to_str().and_then(|n| n.strip_prefix(&lead)) else {
            continue;
        };
        if NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT).is_err() {
            continue;
        }
        if entry.path().join(name).is_dir() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Replace `target` with the copy held in `backup_root`. Returns the number
/// of files restored. The backup itself is left in place.
///
/// The copy is staged in a sibling directory and swapped in with renames, so
/// a copy that fails partway leaves `target` as it was.
pub fn restore(backup_root: &Path, target: &Path) -> Result<usize> {
    let name = source_name(target)?;
    let copy = backup_root.join(name);
    if !copy.is_dir() {
        return Err(TextfixError::RestoreSourceMissing {
            name: name.to_string_lossy().into_owned(),
            path: backup_root.to_path_buf(),
        });
    }

    let staging = tempfile::Builder::new()
        .prefix(".textfix-restore-")
        .tempdir_in(backup_parent(target))?;
    let staged = staging.path().join(name);
    let files = copy_dir_all(&copy, &staged)
        .map_err(|(path, err)| TextfixError::RestoreCopy { path, source: err })?;

    let previous = staging.path().join("previous");
    let had_target = target.exists();
    if had_target {
        std::fs::rename(target, &previous)?;
    }
    if let Err(e) = std::fs::rename(&staged, target) {
        if had_target {
            std::fs::rename(&previous, target)?;
        }
        return Err(e.into());
    }

    tracing::info!(from = %copy.display(), to = %target.display(), files, "restored backup");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn seed(dir: &TempDir) -> PathBuf {
        let commands = dir.path().join("commands");
        std::fs::create_dir_all(commands.join("phase-2")).unwrap();
        std::fs::write(commands.join("prd.md"), "run /bmad/prd").unwrap();
        std::fs::write(commands.join("phase-2/tech-spec.md"), "run /bmad/tech-spec").unwrap();
        commands
    }

    #[test]
    fn snapshot_copies_every_file() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);

        let snap = snapshot_at(&commands, ".command-path-backups", at(9, 30, 0)).unwrap();
        assert_eq!(
            snap.root,
            dir.path().join(".command-path-backups-20250314-093000")
        );
        assert_eq!(snap.copy, snap.root.join("commands"));
        assert_eq!(snap.files, 2);
        for rel in ["prd.md", "phase-2/tech-spec.md"] {
            assert_eq!(
                std::fs::read(commands.join(rel)).unwrap(),
                std::fs::read(snap.copy.join(rel)).unwrap()
            );
        }
    }

    #[test]
    fn snapshot_collision_is_fatal() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);
        snapshot_at(&commands, ".bk", at(1, 2, 3)).unwrap();

        let err = snapshot_at(&commands, ".bk", at(1, 2, 3)).unwrap_err();
        assert!(matches!(err, TextfixError::BackupExists(_)));
        assert!(err.is_backup_failure());
    }

    #[test]
    fn snapshot_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = snapshot_at(&dir.path().join("agents"), ".bk", at(0, 0, 0)).unwrap_err();
        assert!(matches!(err, TextfixError::BackupSourceMissing(_)));
        assert!(!dir.path().join(".bk-20250314-000000").exists());
    }

    #[test]
    fn list_backups_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);
        snapshot_at(&commands, ".bk", at(12, 0, 0)).unwrap();
        snapshot_at(&commands, ".bk", at(8, 0, 0)).unwrap();
        std::fs::create_dir_all(dir.path().join(".bk-not-a-date/commands")).unwrap();
        std::fs::create_dir_all(dir.path().join(".bk-20250101-000000")).unwrap();

        let found = list_backups(&commands, ".bk").unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join(".bk-20250314-080000"),
                dir.path().join(".bk-20250314-120000"),
            ]
        );
    }

    #[test]
    fn restore_replaces_target() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);
        let snap = snapshot_at(&commands, ".bk", at(1, 0, 0)).unwrap();

        std::fs::write(commands.join("prd.md"), "changed").unwrap();
        std::fs::write(commands.join("extra.md"), "new").unwrap();

        let restored = restore(&snap.root, &commands).unwrap();
        assert_eq!(restored, 2);
        assert_eq!(std::fs::read_to_string(commands.join("prd.md")).unwrap(), "run /bmad/prd");
        assert!(!commands.join("extra.md").exists());
        assert!(snap.copy.join("prd.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_restore_keeps_target() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);
        let snap = snapshot_at(&commands, ".bk", at(1, 0, 0)).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone.md"),
            snap.copy.join("dangling.md"),
        )
        .unwrap();
        std::fs::write(commands.join("prd.md"), "current").unwrap();

        let err = restore(&snap.root, &commands).unwrap_err();
        match err {
            TextfixError::RestoreCopy { path, .. } => assert!(path.ends_with("dangling.md")),
            other => panic!("expected RestoreCopy, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(commands.join("prd.md")).unwrap(), "current");
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(".textfix-restore-")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn restore_requires_matching_copy() {
        let dir = TempDir::new().unwrap();
        let commands = seed(&dir);
        let empty = dir.path().join(".bk-20250314-010000");
        std::fs::create_dir_all(&empty).unwrap();

        let err = restore(&empty, &commands).unwrap_err();
        assert!(matches!(err, TextfixError::RestoreSourceMissing { .. }));
        assert!(commands.join("prd.md").exists());
    }
}
