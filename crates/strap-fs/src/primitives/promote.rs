use crate::{Error, Result};
use std::path::Path;

/// Move the directory `src` to the vacant path `dest` with a single rename.
///
/// Observers of `dest` see either nothing or the complete tree. If anything
/// already exists at `dest` the call fails with `AlreadyExists` and `src` is
/// left untouched.
pub fn promote_dir(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    // rename(2) silently replaces an empty directory, so check first.
    if std::fs::symlink_metadata(dest).is_ok() {
        return Err(Error::ReplaceDir {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination already exists",
            ),
        });
    }

    std::fs::rename(src, dest).map_err(|e| Error::ReplaceDir {
        from: src.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    })
}
