//! Error types for install attempts, hooks, storage links and configuration.

use std::io;

use thiserror::Error;

/// Phase of an attempt that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    Cleanup,
    Extraction,
    Promotion,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Cleanup => "cleanup",
            Self::Extraction => "extraction",
            Self::Promotion => "promotion",
        })
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to acquire install lock: {0}")]
    Lock(#[source] strap_fs::Error),

    #[error("failed to prepare install directories: {0}")]
    Cleanup(#[source] strap_fs::Error),

    #[error("failed to open archive source {source_name}: {source}")]
    Source {
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract archive: {0}")]
    Archive(#[from] strap_archive::Error),

    #[error("failed to promote staging directory: {0}")]
    Promotion(#[source] strap_fs::Error),
}

impl InstallError {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Lock(_) | Self::Cleanup(_) => FailureReason::Cleanup,
            Self::Source { .. } | Self::Archive(_) => FailureReason::Extraction,
            Self::Promotion(_) => FailureReason::Promotion,
        }
    }

    /// Whether the same payload may succeed on another attempt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Archive(e) => e.is_recoverable(),
            Self::Lock(_) | Self::Cleanup(_) | Self::Source { .. } | Self::Promotion(_) => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Fs(#[from] strap_fs::Error),

    #[error(transparent)]
    Platform(#[from] strap_platform::Error),

    #[error("failed to fetch repository {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Fs(#[from] strap_fs::Error),

    #[error("storage link name '{0}' must be a single path component")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error(transparent)]
    Checksum(#[from] strap_archive::Error),

    #[error(transparent)]
    Platform(#[from] strap_platform::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}
