use crate::{Error, Result};
use std::path::Path;

/// Remove whatever is at `path`: a directory tree, a file, or a symlink.
///
/// Symlinks are removed themselves, never followed. Returns `false` when
/// nothing existed at `path`.
pub fn remove_path(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(Error::Remove {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), "removed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_path_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(!remove_path(dir.path().join("absent")).unwrap());
    }

    #[test]
    fn removes_directory_tree() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("usr");
        std::fs::create_dir_all(root.join("lib/apt")).unwrap();
        std::fs::write(root.join("lib/apt/methods"), "x").unwrap();

        assert!(remove_path(&root).unwrap());
        assert!(!root.exists());
    }

    #[test]
    fn removes_plain_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("usr");
        std::fs::write(&file, "not a directory").unwrap();

        assert!(remove_path(&file).unwrap());
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn removes_symlink_without_following() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("real");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "data").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(remove_path(&link).unwrap());
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(target.join("keep").exists());
    }
}
