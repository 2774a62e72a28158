use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to remove '{}': {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to move '{}' to '{}': {source}", from.display(), to.display())]
    ReplaceDir {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to create symlink '{}' -> '{}': {source}", link.display(), target.display())]
    Symlink {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },

    #[error("failed to set permissions on '{}': {source}", path.display())]
    Permissions { path: PathBuf, source: io::Error },

    #[error("failed to lock '{}': {source}", path.display())]
    Lock { path: PathBuf, source: io::Error },
}

impl Error {
    /// The path the failed operation was acting on.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::CreateDir { path, .. }
            | Self::Remove { path, .. }
            | Self::Permissions { path, .. }
            | Self::Lock { path, .. } => path,
            Self::ReplaceDir { to, .. } => to,
            Self::Symlink { link, .. } => link,
        }
    }

    /// The underlying I/O error.
    pub fn io(&self) -> &io::Error {
        match self {
            Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::CreateDir { source, .. }
            | Self::Remove { source, .. }
            | Self::ReplaceDir { source, .. }
            | Self::Symlink { source, .. }
            | Self::Permissions { source, .. }
            | Self::Lock { source, .. } => source,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.io().kind()
    }

    /// Consumes the error, keeping only the I/O cause.
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::CreateDir { source, .. }
            | Self::Remove { source, .. }
            | Self::ReplaceDir { source, .. }
            | Self::Symlink { source, .. }
            | Self::Permissions { source, .. }
            | Self::Lock { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
