//! Named links from a storage directory to shared external directories.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use strap_fs::PermissionMode;

use crate::config::InstallConfig;
use crate::error::StorageError;

#[derive(Clone, Debug)]
pub struct StorageLinks {
    directory: PathBuf,
    links: BTreeMap<String, PathBuf>,
}

impl StorageLinks {
    pub fn new(directory: impl Into<PathBuf>, links: BTreeMap<String, PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            links,
        }
    }

    pub fn from_config(config: &InstallConfig) -> Self {
        Self::new(config.storage_directory(), config.storage.links.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Recreate the storage directory holding exactly the configured links.
    ///
    /// Existing contents are removed without following symlinks, so link
    /// targets are never touched. Targets need not exist.
    pub fn setup(&self) -> Result<usize, StorageError> {
        for name in self.links.keys() {
            if !is_single_component(name) {
                return Err(StorageError::InvalidName(name.clone()));
            }
        }

        strap_fs::remove_path(&self.directory)?;
        strap_fs::ensure_dir(&self.directory, PermissionMode::Inherit)?;

        for (name, target) in &self.links {
            let link = self.directory.join(name);
            strap_fs::symlink(target, &link)?;
            tracing::debug!(link = %link.display(), target = %target.display(), "created storage link");
        }

        tracing::info!(
            directory = %self.directory.display(),
            links = self.links.len(),
            "storage links ready"
        );
        Ok(self.links.len())
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
