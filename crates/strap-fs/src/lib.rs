//! Filesystem primitives for staged installs.
//!
//! - `primitives` - remove, create, promote, symlink and atomic write
//! - `permissions` - Unix mode handling
//! - `lock` - per-target exclusive lock

mod error;
pub mod lock;
pub mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use lock::InstallLock;
pub use permissions::PermissionMode;
pub use primitives::{
    WriteOptions, atomic_write, ensure_dir, is_effectively_empty, promote_dir, remove_path, symlink,
};
