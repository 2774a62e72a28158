use std::io::{self, Read};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Expected SHA-256 digest of an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksum([u8; 32]);

impl Checksum {
    pub fn parse(hex_digest: &str) -> Result<Self> {
        let invalid = || Error::InvalidChecksum(hex_digest.to_owned());
        let bytes = hex::decode(hex_digest.trim()).map_err(|_| invalid())?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self(digest))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Reader that hashes every byte passing through it.
pub struct VerifiedReader<R> {
    reader: R,
    hasher: Sha256,
    bytes: u64,
}

impl<R> VerifiedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Compare what has been read so far against `expected`.
    ///
    /// Only meaningful once the inner reader is exhausted.
    pub fn finish(self, expected: &Checksum) -> Result<R> {
        let actual = self.hasher.finalize();
        if actual.as_slice() == expected.0 {
            Ok(self.reader)
        } else {
            Err(Error::ChecksumMismatch {
                expected: expected.to_hex(),
                actual: hex::encode(actual),
            })
        }
    }
}

impl<R: Read> Read for VerifiedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes += n as u64;
        }
        Ok(n)
    }
}
