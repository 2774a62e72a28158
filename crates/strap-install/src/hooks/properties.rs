use std::path::PathBuf;

use strap_fs::{PermissionMode, WriteOptions};

use super::{HookContext, PostInstallHook};
use crate::error::HookError;

/// Writes the default terminal configuration file, replacing any previous one.
#[derive(Clone, Debug)]
pub struct PropertiesHook {
    path: PathBuf,
    content: String,
}

impl PropertiesHook {
    /// `path` is resolved against the home directory when relative.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl PostInstallHook for PropertiesHook {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn run(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        let path = ctx.in_home(&self.path);
        if let Some(parent) = path.parent() {
            strap_fs::ensure_dir(parent, PermissionMode::Inherit)?;
        }
        strap_fs::atomic_write(
            &path,
            self.content.as_bytes(),
            WriteOptions::new().permissions(PermissionMode::ReadWrite),
        )?;
        tracing::info!(path = %path.display(), "wrote configuration file");
        Ok(())
    }
}
