use crate::permissions::PermissionMode;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Create `path` and any missing parents, then apply `mode` to `path` itself.
///
/// Idempotent. Fails if a non-directory already occupies `path`.
pub fn ensure_dir(path: impl AsRef<Path>, mode: PermissionMode) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })?;
    mode.apply_to_path(path)
}

/// Whether `dir` holds nothing but directories and the `ignored` files.
///
/// `ignored` paths are relative to `dir`. An ignored directory hides
/// everything below it. Symlinks are never followed and count as content.
pub fn is_effectively_empty<P: AsRef<Path>>(dir: impl AsRef<Path>, ignored: &[P]) -> Result<bool> {
    let dir = dir.as_ref();
    let ignored: Vec<PathBuf> = ignored.iter().map(|p| p.as_ref().to_path_buf()).collect();
    scan(dir, Path::new(""), &ignored)
}

fn scan(root: &Path, relative: &Path, ignored: &[PathBuf]) -> Result<bool> {
    let current = root.join(relative);
    let read = std::fs::read_dir(&current).map_err(|e| Error::Read {
        path: current.clone(),
        source: e,
    })?;

    for entry in read {
        let entry = entry.map_err(|e| Error::Read {
            path: current.clone(),
            source: e,
        })?;
        let child = relative.join(entry.file_name());
        if ignored.iter().any(|i| child.starts_with(i)) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| Error::Read {
            path: entry.path(),
            source: e,
        })?;
        if !file_type.is_dir() || !scan(root, &child, ignored)? {
            return Ok(false);
        }
    }

    Ok(true)
}
