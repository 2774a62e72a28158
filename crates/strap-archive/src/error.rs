use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive is corrupted: {0}")]
    CorruptArchive(String),

    #[error("archive source failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed symlink manifest line {line_number}: '{line}'")]
    MalformedManifest { line_number: usize, line: String },

    #[error("archive does not contain any symlinks in '{manifest}'")]
    MissingSymlinkManifest { manifest: String },

    #[error("archive entry '{entry}' escapes the extraction root")]
    UnsafePath { entry: String },

    #[error("failed to extract '{}': {source}", path.display())]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("invalid checksum '{0}'")]
    InvalidChecksum(String),

    #[error("archive checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl Error {
    /// Whether retrying with the same payload may succeed.
    ///
    /// Payload-integrity errors point at a packaging defect and are never
    /// recoverable by retrying alone.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::ExtractionFailed { .. } => true,
            Self::CorruptArchive(_)
            | Self::MalformedManifest { .. }
            | Self::MissingSymlinkManifest { .. }
            | Self::UnsafePath { .. }
            | Self::InvalidChecksum(_)
            | Self::ChecksumMismatch { .. } => false,
        }
    }
}

impl Error {
    /// Classify a failed read of archive data.
    ///
    /// The decoder reports truncated or inconsistent entry data as
    /// `UnexpectedEof` or `InvalidData`; anything else came from the source.
    pub fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
                Self::CorruptArchive(err.to_string())
            }
            _ => Self::Io(err),
        }
    }
}

impl From<strap_fs::Error> for Error {
    fn from(e: strap_fs::Error) -> Self {
        let path = e.path().to_path_buf();
        Self::ExtractionFailed {
            path,
            source: e.into_io(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
