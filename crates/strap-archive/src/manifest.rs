//! Deferred symlink table.
//!
//! The manifest can name link targets that appear later in the archive, so
//! rules are only collected while streaming and applied once every regular
//! entry has been written.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use strap_fs::PermissionMode;

use crate::error::{Error, Result};
use crate::sanitize;

pub const DEFAULT_MANIFEST_NAME: &str = "SYMLINKS.txt";
pub const DEFAULT_DELIMITER: char = '\u{2190}';

/// One `<target>←<link>` manifest line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymlinkRule {
    /// Stored verbatim; may dangle.
    pub target: String,
    /// Absolute, under the extraction root.
    pub link_path: PathBuf,
}

#[derive(Debug)]
pub struct SymlinkTable {
    root: PathBuf,
    delimiter: char,
    rules: Vec<SymlinkRule>,
    seen_manifest: bool,
}

impl SymlinkTable {
    pub fn new(root: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            root: root.into(),
            delimiter,
            rules: Vec::new(),
            seen_manifest: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse a manifest and queue its rules.
    ///
    /// The parent directories of each link are created right away, so later
    /// entries and the final apply pass never race on them.
    pub fn read_manifest<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        self.seen_manifest = true;
        let before = self.rules.len();

        for (index, line) in reader.split(b'\n').enumerate() {
            let line_number = index + 1;
            let raw = line.map_err(Error::from_read)?;
            let line = String::from_utf8(raw).map_err(|e| Error::MalformedManifest {
                line_number,
                line: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            })?;
            let line = line.strip_suffix('\r').unwrap_or(&line);

            let rule = self.parse_line(line_number, line)?;
            if let Some(parent) = rule.link_path.parent() {
                strap_fs::ensure_dir(parent, PermissionMode::Inherit)?;
            }
            tracing::trace!(
                link_target = %rule.target,
                link = %rule.link_path.display(),
                "queued symlink"
            );
            self.rules.push(rule);
        }

        Ok(self.rules.len() - before)
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<SymlinkRule> {
        let malformed = || Error::MalformedManifest {
            line_number,
            line: line.to_owned(),
        };

        let mut parts = line.split(self.delimiter);
        let (Some(target), Some(link), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        if target.is_empty() || link.is_empty() {
            return Err(malformed());
        }

        let relative = sanitize::normalize(link)?;
        if relative.as_os_str().is_empty() {
            return Err(malformed());
        }

        Ok(SymlinkRule {
            target: target.to_owned(),
            link_path: self.root.join(relative),
        })
    }

    pub fn seen_manifest(&self) -> bool {
        self.seen_manifest
    }

    pub fn rules(&self) -> &[SymlinkRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Create every queued link in manifest order.
    pub fn apply(&self) -> Result<usize> {
        for rule in &self.rules {
            strap_fs::symlink(&rule.target, &rule.link_path)?;
            tracing::debug!(
                link_target = %rule.target,
                link = %rule.link_path.display(),
                "created symlink"
            );
        }
        Ok(self.rules.len())
    }
}
