use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the archive bytes come from.
///
/// Each attempt opens a fresh reader, so a retry re-reads from the start.
pub trait ArchiveSource {
    fn open(&self) -> io::Result<Box<dyn Read>>;

    /// Short label for logs and error messages.
    fn describe(&self) -> String;
}

#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Archive bytes held in memory, e.g. embedded in the binary.
#[derive(Clone, Debug)]
pub struct BytesSource {
    bytes: Arc<[u8]>,
}

impl BytesSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ArchiveSource for BytesSource {
    fn open(&self) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }

    fn describe(&self) -> String {
        format!("<{} embedded bytes>", self.bytes.len())
    }
}
