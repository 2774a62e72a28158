//! Forward-only archive decoding.

use std::io::{self, Read};

use zip::result::ZipError;

use crate::entry::{ArchiveEntry, EntryKind};
use crate::error::{Error, Result};

/// A lazy, forward-only sequence of archive entries.
///
/// Not restartable: re-reading requires a fresh byte source. `None` marks
/// the end; after an error the sequence is finished as well.
pub trait EntrySource {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>>>;
}

/// Single-pass zip decoder over any byte stream.
///
/// Entries are decoded from their local headers as they arrive, so the
/// source never needs to be seekable or held in memory.
pub struct ZipStream<R: Read> {
    reader: Latched<R>,
    index: usize,
    done: bool,
}

impl<R: Read> ZipStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Latched::new(reader),
            index: 0,
            done: false,
        }
    }

    /// Number of entries handed out so far.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Drain what is left of the byte source and hand it back.
    ///
    /// Trailing data such as the central directory passes through the
    /// source, which matters for readers that hash what they yield.
    pub fn finish(mut self) -> Result<R> {
        io::copy(&mut self.reader, &mut io::sink())?;
        self.reader.into_inner()
    }
}

impl<R: Read> EntrySource for ZipStream<R> {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>>> {
        if self.done {
            return None;
        }
        if let Some(kind) = self.reader.failure() {
            self.done = true;
            return Some(Err(Error::Io(io::Error::new(
                kind,
                "archive source failed while reading a previous entry",
            ))));
        }

        match zip::read::read_zipfile_from_stream(&mut self.reader) {
            Ok(Some(file)) => {
                self.index += 1;
                let path = file.name().to_owned();
                let kind = if file.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                let mode = file.unix_mode();
                tracing::trace!(index = self.index, path = %path, "decoded entry header");
                Some(Ok(ArchiveEntry::new(path, kind, mode, Box::new(file))))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(decode_error(e)))
            }
        }
    }
}

fn decode_error(err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::from_read(e),
        other => Error::CorruptArchive(other.to_string()),
    }
}

/// Passes reads through until the first hard error, then reports EOF.
///
/// The zip decoder drains unread entry data when an entry is dropped and
/// treats a read error there as fatal. Latching keeps a failed source quiet
/// until the next entry is requested, where the failure is reported.
struct Latched<R> {
    inner: R,
    failed: Option<io::ErrorKind>,
}

impl<R> Latched<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            failed: None,
        }
    }

    fn failure(&self) -> Option<io::ErrorKind> {
        self.failed
    }

    fn into_inner(self) -> Result<R> {
        match self.failed {
            Some(kind) => Err(Error::Io(io::Error::new(kind, "archive source failed"))),
            None => Ok(self.inner),
        }
    }
}

impl<R: Read> Read for Latched<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed.is_some() {
            return Ok(0);
        }
        match self.inner.read(buf) {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                self.failed = Some(e.kind());
                Err(e)
            }
            other => other,
        }
    }
}
