use crate::permissions::PermissionMode;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub permissions: PermissionMode,
    pub sync: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: PermissionMode) -> Self {
        self.permissions = mode;
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to a sibling `<name>.tmp` file, then rename it over `path`.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: Options) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("no parent directory"),
    })?;
    let file_name = path.file_name().ok_or_else(|| Error::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("no file name"),
    })?;

    let tmp_path = parent.join(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = fs::File::create(&tmp_path).map_err(|e| Error::Write {
        path: tmp_path.clone(),
        source: e,
    })?;
    file.write_all(content).map_err(|e| Error::Write {
        path: tmp_path.clone(),
        source: e,
    })?;
    if options.sync {
        file.sync_all().map_err(|e| Error::Write {
            path: tmp_path.clone(),
            source: e,
        })?;
    }
    drop(file);

    options.permissions.apply_to_path(&tmp_path)?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
