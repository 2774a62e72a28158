#[cfg(unix)]
use crate::Error;
use crate::Result;
use std::path::Path;

/// Permission bits applied to installed files and directories.
///
/// Only meaningful on Unix. On other platforms applying a mode is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Keep whatever the file was created with (process umask).
    #[default]
    Inherit,

    /// `0o700` (rwx------). Used for executables and private directories.
    OwnerOnly,

    /// `0o644` (rw-r--r--).
    ReadWrite,

    /// Explicit Unix mode bits.
    Custom(u32),
}

impl PermissionMode {
    pub fn custom(unix_mode: u32) -> Self {
        Self::Custom(unix_mode & 0o7777)
    }

    /// Mode bits, or `None` for [`PermissionMode::Inherit`].
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::OwnerOnly => Some(0o700),
            Self::ReadWrite => Some(0o644),
            Self::Custom(mode) => Some(mode),
        }
    }

    pub fn is_executable(self) -> bool {
        self.to_unix_mode().is_some_and(|m| m & 0o111 != 0)
    }

    /// Apply the mode to `path`. Symlinks are followed.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        let Some(mode) = self.to_unix_mode() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
                Error::Permissions {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        #[cfg(not(unix))]
        let _ = (mode, path);

        Ok(())
    }
}

impl From<u32> for PermissionMode {
    fn from(mode: u32) -> Self {
        Self::custom(mode)
    }
}
