use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextfixError {
    #[error("backup source not found or not a directory: {0}")]
    BackupSourceMissing(PathBuf),

    #[error("backup destination already exists: {0}")]
    BackupExists(PathBuf),

    #[error("backup copy failed at {path}: {source}")]
    BackupCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("rules file not found: {0}")]
    RulesFileNotFound(PathBuf),

    #[error("backup does not contain a copy of '{name}': {path}")]
    RestoreSourceMissing { name: String, path: PathBuf },

    #[error("restore copy failed at {path}: {source}")]
    RestoreCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backups found for prefix '{0}'")]
    NoBackups(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl TextfixError {
    /// Errors raised while taking the pre-mutation snapshot. These abort a run.
    pub fn is_backup_failure(&self) -> bool {
        matches!(
            self,
            TextfixError::BackupSourceMissing(_)
                | TextfixError::BackupExists(_)
                | TextfixError::BackupCopy { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TextfixError>;
