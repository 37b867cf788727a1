use crate::error::{Result, TextfixError};
use crate::io::atomic_write;
use crate::rules::{apply_rules, AppliedRule, ReplacementRule};
use serde::Serialize;
use std::path::Path;

/// Result of running a rule set over one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub changed: bool,
    pub applied: Vec<AppliedRule>,
}

/// Read `path`, apply `rules` in order, and write the file back only if its
/// content changed. An unchanged file is never touched on disk.
pub fn apply_replacements<'a, I>(path: &Path, rules: I) -> Result<FileChange>
where
    I: IntoIterator<Item = &'a ReplacementRule>,
{
    transform(path, rules, true)
}

/// Same as [`apply_replacements`] without writing anything.
pub fn preview_replacements<'a, I>(path: &Path, rules: I) -> Result<FileChange>
where
    I: IntoIterator<Item = &'a ReplacementRule>,
{
    transform(path, rules, false)
}

fn transform<'a, I>(path: &Path, rules: I, write: bool) -> Result<FileChange>
where
    I: IntoIterator<Item = &'a ReplacementRule>,
{
    let original = std::fs::read_to_string(path).map_err(|e| TextfixError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (updated, applied) = apply_rules(&original, rules);
    let changed = updated != original;

    if changed && write {
        atomic_write(path, updated.as_bytes()).map_err(|e| TextfixError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    Ok(FileChange { changed, applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule(old: &str, new: &str) -> ReplacementRule {
        ReplacementRule::new(old, new).unwrap()
    }

    #[test]
    fn agent_description_rewritten_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bmad-pm.md");
        std::fs::write(
            &path,
            "Auto-invoked when working with product planning or PRD workflows.",
        )
        .unwrap();

        let rules = [rule(
            "Auto-invoked when working with product planning or PRD workflows.",
            "Use this agent for product planning and PRD workflows.",
        )];
        let change = apply_replacements(&path, &rules).unwrap();

        assert!(change.changed);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Use this agent for product planning and PRD workflows."
        );
    }

    #[test]
    fn single_occurrence_leaves_rest_of_file_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prd.md");
        std::fs::write(&path, "# PRD\n\nRun `/bmad/prd` to start.\n\n- keep me\n").unwrap();

        apply_replacements(&path, &[rule("/bmad/prd", "/bmad:phase-2:prd")]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# PRD\n\nRun `/bmad:phase-2:prd` to start.\n\n- keep me\n"
        );
    }

    #[test]
    fn no_match_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.md");
        std::fs::write(&path, "nothing to see\r\n").unwrap();
        let before = std::fs::read(&path).unwrap();
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();

        let change = apply_replacements(&path, &[rule("/bmad/prd", "x")]).unwrap();

        assert!(!change.changed);
        assert!(change.applied.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn second_application_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.md");
        std::fs::write(&path, "/bmad/create-story then /bmad/dev-story").unwrap();
        let rules = [
            rule("/bmad/create-story", "/bmad:phase-4:create-story"),
            rule("/bmad/dev-story", "/bmad:phase-4:dev-story"),
        ];

        let first = apply_replacements(&path, &rules).unwrap();
        let after_first = std::fs::read_to_string(&path).unwrap();
        let second = apply_replacements(&path, &rules).unwrap();

        assert!(first.changed);
        assert_eq!(first.applied.len(), 2);
        assert!(!second.changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn preview_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prd.md");
        std::fs::write(&path, "/bmad/prd").unwrap();

        let change = preview_replacements(&path, &[rule("/bmad/prd", "/bmad:phase-2:prd")]).unwrap();
        assert!(change.changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/bmad/prd");
    }

    #[cfg(unix)]
    #[test]
    fn read_only_file_is_a_write_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prd.md");
        std::fs::write(&path, "/bmad/prd").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();

        let err = apply_replacements(&path, &[rule("/bmad/prd", "/bmad:phase-2:prd")]).unwrap_err();
        assert!(matches!(err, TextfixError::FileWrite { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/bmad/prd");
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = apply_replacements(&path, &[rule("a", "b")]).unwrap_err();
        assert!(matches!(err, TextfixError::FileRead { .. }));
    }
}
