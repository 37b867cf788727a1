use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A copy failure and the path it happened at.
pub type CopyError = (PathBuf, std::io::Error);

/// Atomically replace `path` with `data` using a tempfile in the same directory.
///
/// A symlink is written through to the file it points at. An existing file
/// must be writable by the caller; the rename alone would bypass its mode, so
/// a read-only target fails with `PermissionDenied`. The target's permissions
/// are carried over to the new file.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let path = resolve_link(path)?;
    let permissions = match std::fs::metadata(&path) {
        Ok(meta) => {
            ensure_writable(&path, &meta)?;
            Some(meta.permissions())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    if let Some(perms) = permissions {
        std::fs::set_permissions(tmp.path(), perms)?;
    }
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(())
}

fn resolve_link(path: &Path) -> std::io::Result<PathBuf> {
    let is_link = std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if is_link {
        std::fs::canonicalize(path)
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_writable(path: &Path, meta: &std::fs::Metadata) -> std::io::Result<()> {
    if meta.permissions().readonly() {
        return Err(std::io::Error::new(
            ErrorKind::PermissionDenied,
            format!("{} is read-only", path.display()),
        ));
    }
    // Opening without truncation checks ownership and ACLs the mode bits miss.
    std::fs::OpenOptions::new().write(true).open(path)?;
    Ok(())
}

/// Copy `src` into `dst` recursively, creating `dst`. Returns the number of files copied.
///
/// Symlinks are followed. Any failure is reported against the path being
/// copied when it happened.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<usize, CopyError> {
    std::fs::create_dir_all(dst).map_err(|e| (dst.to_path_buf(), e))?;
    let mut entries = std::fs::read_dir(src)
        .map_err(|e| (src.to_path_buf(), e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| (src.to_path_buf(), e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut copied = 0;
    for entry in entries {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copied += copy_dir_all(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).map_err(|e| (src_path.clone(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
