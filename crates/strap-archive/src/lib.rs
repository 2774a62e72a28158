//! Streaming extraction of bootstrap archives into a staging directory.
//!
//! Entries are pulled one at a time from an [`EntrySource`], regular files are
//! written with their permission class applied, and the symlink manifest is
//! collected and materialized only after every file is in place.

mod entry;
mod error;
pub mod extract;
pub mod manifest;
pub mod reader;
pub mod rules;
pub mod sanitize;
pub mod verify;

pub use entry::{ArchiveEntry, EntryKind};
pub use error::{Error, Result};
pub use extract::{ExtractOptions, ExtractReport, extract};
pub use manifest::{DEFAULT_DELIMITER, DEFAULT_MANIFEST_NAME, SymlinkRule, SymlinkTable};
pub use reader::{EntrySource, ZipStream};
pub use rules::{DEFAULT_EXECUTABLE_PREFIXES, PermissionClass, PermissionRules};
pub use verify::{Checksum, VerifiedReader};
