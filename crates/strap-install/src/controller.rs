//! Staged install of a bootstrap archive into its live root.
//!
//! Everything is extracted into a private staging directory first. The live
//! root only ever appears through a single rename, so an interrupted or
//! failed attempt never leaves a partial tree where the environment expects
//! a complete one.

use std::io::Read;
use std::path::{Path, PathBuf};

use strap_archive::{Checksum, ExtractOptions, ExtractReport, VerifiedReader, ZipStream};
use strap_fs::{InstallLock, PermissionMode};

use crate::config::{DEFAULT_PLACEHOLDERS, InstallConfig};
use crate::error::{ConfigError, InstallError};
use crate::source::ArchiveSource;
use crate::state::{InstallFailure, InstallOutcome, InstallReport, InstallState};

#[derive(Clone, Debug)]
pub struct Installer {
    live_root: PathBuf,
    staging_root: PathBuf,
    placeholders: Vec<PathBuf>,
    directory_mode: PermissionMode,
    extract: ExtractOptions,
    checksum: Option<Checksum>,
    lock: bool,
}

impl Installer {
    pub fn new(live_root: impl Into<PathBuf>, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            live_root: live_root.into(),
            staging_root: staging_root.into(),
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(PathBuf::from).collect(),
            directory_mode: PermissionMode::OwnerOnly,
            extract: ExtractOptions::default(),
            checksum: None,
            lock: true,
        }
    }

    pub fn from_config(config: &InstallConfig) -> Result<Self, ConfigError> {
        Ok(
            Self::new(&config.layout.live_root, &config.layout.staging_root)
                .placeholders(config.layout.placeholders.clone())
                .directory_mode(config.directory_mode())
                .extract_options(config.archive.extract_options())
                .checksum(config.archive.checksum()?)
                .lock(config.lock.enabled),
        )
    }

    pub fn placeholders(mut self, placeholders: Vec<PathBuf>) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn directory_mode(mut self, mode: PermissionMode) -> Self {
        self.directory_mode = mode;
        self
    }

    pub fn extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    pub fn checksum(mut self, checksum: Option<Checksum>) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn lock(mut self, enabled: bool) -> Self {
        self.lock = enabled;
        self
    }

    pub fn live_root(&self) -> &Path {
        &self.live_root
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// `.<live-name>.lock`, next to the live root.
    pub fn lock_path(&self) -> PathBuf {
        let name = self
            .live_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "strap".to_owned());
        self.live_parent().join(format!(".{name}.lock"))
    }

    fn live_parent(&self) -> &Path {
        self.live_root.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whether the live root holds a complete installation.
    ///
    /// Recomputed from disk on every call. A symlink to a directory counts as
    /// a directory; anything that is not a directory counts as not installed.
    pub fn is_installed(&self) -> strap_fs::Result<bool> {
        match std::fs::metadata(&self.live_root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(strap_fs::Error::Read {
                    path: self.live_root.clone(),
                    source: e,
                });
            }
        }
        Ok(!strap_fs::is_effectively_empty(&self.live_root, &self.placeholders)?)
    }

    /// Run one attempt from `Idle` to `Done` or `Failed`.
    pub fn install(&self, source: &dyn ArchiveSource) -> InstallOutcome {
        let mut attempt = Attempt::new();

        // The read-only check comes first so a complete root is never written to.
        match self.is_installed() {
            Ok(true) => return self.already_installed(attempt),
            Ok(false) => {}
            Err(e) => return attempt.fail(InstallError::Cleanup(e)),
        }

        let _lock = if self.lock {
            match self.acquire_lock() {
                Ok(lock) => Some(lock),
                Err(e) => return attempt.fail(InstallError::Lock(e)),
            }
        } else {
            None
        };

        // Another process may have finished while we waited for the lock.
        if self.lock {
            match self.is_installed() {
                Ok(true) => return self.already_installed(attempt),
                Ok(false) => {}
                Err(e) => return attempt.fail(InstallError::Cleanup(e)),
            }
        }

        attempt.enter(InstallState::Cleaning);
        if let Err(e) = self.clean() {
            return attempt.fail(InstallError::Cleanup(e));
        }

        attempt.enter(InstallState::Extracting);
        let report = match self.extract_into_staging(source) {
            Ok(report) => report,
            Err(e) => return attempt.fail(e),
        };

        attempt.enter(InstallState::Promoting);
        if let Err(e) = strap_fs::promote_dir(&self.staging_root, &self.live_root) {
            return attempt.fail(InstallError::Promotion(e));
        }

        attempt.enter(InstallState::Done);
        tracing::info!(
            live = %self.live_root.display(),
            files = report.files,
            symlinks = report.symlinks,
            "bootstrap installed"
        );
        attempt.succeed(Some(report))
    }

    fn already_installed(&self, mut attempt: Attempt) -> InstallOutcome {
        tracing::info!(live = %self.live_root.display(), "already installed");
        attempt.enter(InstallState::Done);
        attempt.succeed(None)
    }

    fn acquire_lock(&self) -> strap_fs::Result<InstallLock> {
        strap_fs::ensure_dir(self.live_parent(), PermissionMode::Inherit)?;
        InstallLock::acquire(self.lock_path())
    }

    fn clean(&self) -> strap_fs::Result<()> {
        if strap_fs::remove_path(&self.staging_root)? {
            tracing::info!(path = %self.staging_root.display(), "removed stale staging directory");
        }
        if strap_fs::remove_path(&self.live_root)? {
            tracing::info!(path = %self.live_root.display(), "removed incomplete live root");
        }
        strap_fs::ensure_dir(self.live_parent(), PermissionMode::Inherit)?;
        strap_fs::ensure_dir(&self.staging_root, self.directory_mode)
    }

    fn extract_into_staging(
        &self,
        source: &dyn ArchiveSource,
    ) -> Result<ExtractReport, InstallError> {
        let reader = source.open().map_err(|e| InstallError::Source {
            source_name: source.describe(),
            source: e,
        })?;
        tracing::info!(source = %source.describe(), staging = %self.staging_root.display(), "extracting");

        match &self.checksum {
            None => self.extract_stream(reader).map(|(report, _)| report),
            Some(expected) => {
                let (report, verified) = self.extract_stream(VerifiedReader::new(reader))?;
                verified.finish(expected)?;
                tracing::debug!(sha256 = %expected, "archive checksum verified");
                Ok(report)
            }
        }
    }

    fn extract_stream<R: Read>(&self, reader: R) -> Result<(ExtractReport, R), InstallError> {
        let mut stream = ZipStream::new(reader);
        let report = strap_archive::extract(&mut stream, &self.staging_root, &self.extract)?;
        let reader = stream.finish()?;
        Ok((report, reader))
    }
}

/// State trail of one attempt.
struct Attempt {
    states: Vec<InstallState>,
}

impl Attempt {
    fn new() -> Self {
        Self {
            states: vec![InstallState::Idle],
        }
    }

    fn current(&self) -> InstallState {
        self.states
            .last()
            .copied()
            .unwrap_or(InstallState::Idle)
    }

    fn enter(&mut self, next: InstallState) {
        debug_assert!(self.current().can_enter(next), "{:?} -> {next:?}", self.current());
        tracing::debug!(from = ?self.current(), to = ?next, "install state");
        self.states.push(next);
    }

    fn succeed(self, extracted: Option<ExtractReport>) -> InstallOutcome {
        InstallOutcome::Success(InstallReport {
            extracted,
            states: self.states,
        })
    }

    fn fail(mut self, error: InstallError) -> InstallOutcome {
        let phase = self.current();
        self.enter(InstallState::Failed);
        let failure = InstallFailure::new(error, self.states);
        tracing::error!(
            ?phase,
            reason = %failure.reason,
            recoverable = failure.recoverable,
            error = %failure.error,
            "install attempt failed"
        );
        InstallOutcome::Failure(failure)
    }
}
