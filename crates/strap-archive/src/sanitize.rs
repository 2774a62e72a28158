use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive-relative path under `root`.
///
/// `.` components are dropped and `..` pops within the entry itself. Anything
/// absolute, or any `..` that would climb above `root`, is rejected.
pub fn resolve_under(root: &Path, entry: &str) -> Result<PathBuf> {
    let relative = normalize(entry)?;
    Ok(root.join(relative))
}

/// The cleaned relative form of `entry`, without touching the filesystem.
pub fn normalize(entry: &str) -> Result<PathBuf> {
    let unsafe_path = || Error::UnsafePath {
        entry: entry.to_owned(),
    };

    // Archives written on Windows may use backslashes.
    let entry_path = entry.replace('\\', "/");
    let mut result = PathBuf::new();
    for component in Path::new(&entry_path).components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return Err(unsafe_path());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_path()),
        }
    }

    Ok(result)
}
