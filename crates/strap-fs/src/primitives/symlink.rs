use crate::{Error, Result};
use std::path::Path;

/// Create a symlink at `link` pointing at `target`.
///
/// The target is stored verbatim and may dangle. Fails if anything already
/// exists at `link`.
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let created = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };

    created.map_err(|e| Error::Symlink {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        source: e,
    })
}
