use std::io::{self, Read};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One archive entry, borrowed from its source.
///
/// The content stream shares the source's cursor, so an entry must be fully
/// read or skipped before the next one is pulled. The borrow on the source
/// enforces the ordering; dropping an entry drains whatever is left.
pub struct ArchiveEntry<'a> {
    path: String,
    kind: EntryKind,
    mode: Option<u32>,
    content: Box<dyn Read + 'a>,
}

impl<'a> ArchiveEntry<'a> {
    pub fn new(
        path: impl Into<String>,
        kind: EntryKind,
        mode: Option<u32>,
        content: Box<dyn Read + 'a>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            mode,
            content,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Directory, None, Box::new(io::empty()))
    }

    pub fn file(path: impl Into<String>, content: impl Read + 'a) -> Self {
        Self::new(path, EntryKind::File, None, Box::new(content))
    }

    /// Archive-relative, forward-slash separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Mode bits as recorded by the codec, when it records any.
    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    /// Discard the remaining content. Returns the number of bytes skipped.
    pub fn skip(&mut self) -> io::Result<u64> {
        io::copy(&mut self.content, &mut io::sink())
    }
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}

impl Drop for ArchiveEntry<'_> {
    fn drop(&mut self) {
        let _ = self.skip();
    }
}

impl std::fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
