use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use strap_fs::PermissionMode;

use crate::error::{Error, Result};
use crate::manifest::{DEFAULT_DELIMITER, DEFAULT_MANIFEST_NAME, SymlinkTable};
use crate::reader::EntrySource;
use crate::rules::{PermissionClass, PermissionRules};
use crate::sanitize;

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Entry consumed as the symlink manifest and never written to disk.
    pub manifest_name: String,
    pub delimiter: char,
    pub rules: PermissionRules,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_owned(),
            delimiter: DEFAULT_DELIMITER,
            rules: PermissionRules::default(),
        }
    }
}

impl ExtractOptions {
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn rules(mut self, rules: PermissionRules) -> Self {
        self.rules = rules;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files: usize,
    pub directories: usize,
    pub executables: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Stream every entry of `source` into `staging`, then create the symlinks.
///
/// `staging` must already exist. Nothing outside it is written. The first
/// failure aborts the extraction and leaves whatever was written so far for
/// the caller to discard.
pub fn extract<S: EntrySource + ?Sized>(
    source: &mut S,
    staging: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut report = ExtractReport::default();
    let mut symlinks = SymlinkTable::new(staging, options.delimiter);

    tracing::debug!(staging = %staging.display(), "extracting archive");

    while let Some(entry) = source.next_entry() {
        let mut entry = entry?;

        if entry.path() == options.manifest_name {
            let queued = symlinks.read_manifest(BufReader::new(&mut entry))?;
            tracing::debug!(queued, "read symlink manifest");
            continue;
        }

        let relative = sanitize::normalize(entry.path())?;
        let target = staging.join(&relative);

        if entry.is_dir() {
            strap_fs::ensure_dir(&target, PermissionMode::Inherit)?;
            report.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            strap_fs::ensure_dir(parent, PermissionMode::Inherit)?;
        }
        let mut file = File::create(&target).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: e,
        })?;
        let written = copy_entry(&mut entry, &mut file, &target)?;
        drop(file);

        let class = options.rules.classify(&relative.to_string_lossy());
        options.rules.mode_for(class).apply_to_path(&target)?;
        if class == PermissionClass::Executable {
            report.executables += 1;
        }

        tracing::trace!(path = %target.display(), bytes = written, ?class, "wrote file");
        report.files += 1;
        report.bytes += written;
    }

    if !symlinks.seen_manifest() || symlinks.is_empty() {
        return Err(Error::MissingSymlinkManifest {
            manifest: options.manifest_name.clone(),
        });
    }
    report.symlinks = symlinks.apply()?;

    tracing::debug!(
        files = report.files,
        directories = report.directories,
        symlinks = report.symlinks,
        bytes = report.bytes,
        "extraction complete"
    );
    Ok(report)
}

/// Copy entry data into `file`, keeping read and write failures apart.
///
/// Reads fail when the archive is damaged or the source drops; writes fail
/// on the staging side and are reported against `path`.
fn copy_entry(entry: &mut impl Read, file: &mut File, path: &Path) -> Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from_read(e)),
        };
        file.write_all(&buf[..n]).map_err(|e| Error::ExtractionFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        written += n as u64;
    }
}
