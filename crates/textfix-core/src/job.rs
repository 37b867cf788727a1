use crate::error::{Result, TextfixError};
use crate::rules::{
    escapes_target, ReplacementRule, ReplacementSet, RuleBook, RuleScope, RuleWarning,
};
use crate::select::FileFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Everything one replacement pass needs: where to look, what to select, how
/// to name the backup, and the rules to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    /// Target directory, relative to the project root.
    pub target: PathBuf,
    pub backup_prefix: String,
    pub filter: FileFilter,
    pub rules: RuleBook,
}

impl Job {
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.target)
    }

    /// Load a job definition from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TextfixError::RulesFileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let file: JobFile = serde_yaml::from_str(data)?;
        file.try_into()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&JobFile::from(self))?)
    }

    pub fn validate(&self) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();

        if self.rules.is_empty() {
            warnings.push(RuleWarning {
                message: format!("job '{}' has no rules", self.name),
            });
        }

        if let FileFilter::Explicit(paths) = &self.filter {
            for p in paths.iter().filter(|p| escapes_target(p)) {
                warnings.push(RuleWarning {
                    message: format!(
                        "selected file '{}' points outside the target directory",
                        p.display()
                    ),
                });
            }
            for set in self.rules.sets() {
                if let RuleScope::File(p) = &set.scope {
                    if !paths.contains(p) {
                        warnings.push(RuleWarning {
                            message: format!(
                                "rules for '{}' never run: the file is not in the selection list",
                                p.display()
                            ),
                        });
                    }
                }
            }
        }

        warnings.extend(self.rules.validate());
        warnings
    }
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SelectSpec {
    Extension(String),
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileRules {
    path: PathBuf,
    rules: Vec<ReplacementRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobFile {
    name: String,
    target: PathBuf,
    #[serde(default = "default_backup_prefix")]
    backup_prefix: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    select: SelectSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<ReplacementRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<FileRules>,
}

fn default_backup_prefix() -> String {
    ".textfix-backups".to_string()
}

impl TryFrom<JobFile> for Job {
    type Error = TextfixError;

    fn try_from(file: JobFile) -> Result<Self> {
        for rule in file.rules.iter().chain(file.files.iter().flat_map(|f| &f.rules)) {
            rule.check()?;
        }

        // Per-file sets come before the shared table so a file's own rules win.
        let mut sets: Vec<ReplacementSet> = file
            .files
            .into_iter()
            .map(|f| ReplacementSet::for_file(f.path, f.rules))
            .collect();
        if !file.rules.is_empty() {
            sets.push(ReplacementSet::shared(file.rules));
        }

        let filter = match file.select {
            SelectSpec::Extension(ext) => FileFilter::Extension(ext),
            SelectSpec::Files(paths) => FileFilter::Explicit(paths),
        };

        Ok(Job {
            name: file.name,
            target: file.target,
            backup_prefix: file.backup_prefix,
            filter,
            rules: RuleBook::new(sets),
        })
    }
}

impl From<&Job> for JobFile {
    fn from(job: &Job) -> Self {
        let mut rules = Vec::new();
        let mut files = Vec::new();
        for set in job.rules.sets() {
            match &set.scope {
                RuleScope::AllFiles => rules.extend(set.rules.iter().cloned()),
                RuleScope::File(path) => files.push(FileRules {
                    path: path.clone(),
                    rules: set.rules.clone(),
                }),
            }
        }
        let select = match &job.filter {
            FileFilter::Extension(ext) => SelectSpec::Extension(ext.clone()),
            FileFilter::Explicit(paths) => SelectSpec::Files(paths.clone()),
        };
        JobFile {
            name: job.name.clone(),
            target: job.target.clone(),
            backup_prefix: job.backup_prefix.clone(),
            select,
            rules,
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED: &str = r#"
name: links
target: docs
select:
  extension: md
rules:
  - old: /old/a
    new: /new/a
  - old: /old/b
    new: /new/b
"#;

    #[test]
    fn loads_shared_rules() {
        let job = Job::from_yaml(SHARED).unwrap();
        assert_eq!(job.name, "links");
        assert_eq!(job.target, PathBuf::from("docs"));
        assert_eq!(job.backup_prefix, ".textfix-backups");
        assert_eq!(job.filter, FileFilter::Extension("md".into()));
        let patterns: Vec<_> = job.rules.all_rules().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["/old/a", "/old/b"]);
    }

    #[test]
    fn loads_per_file_rules() {
        let yaml = r#"
name: agents
target: agents
backup_prefix: .agent-backups
select:
  files: [pm.md]
files:
  - path: pm.md
    rules:
      - old: Auto-invoked
        new: Use this agent
"#;
        let job = Job::from_yaml(yaml).unwrap();
        assert_eq!(job.filter, FileFilter::Explicit(vec!["pm.md".into()]));
        assert_eq!(job.rules.rules_for(Path::new("pm.md")).len(), 1);
        assert!(job.rules.rules_for(Path::new("sm.md")).is_empty());
        assert!(job.validate().is_empty());
    }

    #[test]
    fn empty_pattern_rejected_on_load() {
        let yaml = r#"
name: bad
target: docs
select:
  extension: md
rules:
  - old: ""
    new: x
"#;
        let err = Job::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TextfixError::InvalidRule(_)));
    }

    #[test]
    fn missing_file_reported() {
        let err = Job::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, TextfixError::RulesFileNotFound(_)));
    }

    #[test]
    fn yaml_survives_save_and_load() {
        let job = Job::from_yaml(SHARED).unwrap();
        let again = Job::from_yaml(&job.to_yaml().unwrap()).unwrap();
        assert_eq!(job, again);
    }

    #[test]
    fn select_is_written_as_a_plain_map() {
        let yaml = Job::from_yaml(SHARED).unwrap().to_yaml().unwrap();
        assert!(yaml.contains("select:\n  extension: md\n"), "{yaml}");
        assert!(!yaml.contains('!'));
    }

    #[test]
    fn validate_flags_escaping_selection() {
        let yaml = r#"
name: agents
target: agents
select:
  files: [../secrets.md, /etc/motd]
files:
  - path: ../secrets.md
    rules:
      - old: a
        new: b
"#;
        let job = Job::from_yaml(yaml).unwrap();
        let escaping = job
            .validate()
            .iter()
            .filter(|w| w.message.contains("selected file"))
            .count();
        assert_eq!(escaping, 2);
    }

    #[test]
    fn validate_flags_unselected_file_scope() {
        let yaml = r#"
name: agents
target: agents
select:
  files: [pm.md]
files:
  - path: sm.md
    rules:
      - old: a
        new: b
"#;
        let job = Job::from_yaml(yaml).unwrap();
        let warnings = job.validate();
        assert!(warnings.iter().any(|w| w.message.contains("not in the selection list")));
    }
}
