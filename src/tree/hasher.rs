//! Content comparison for files using BLAKE3
//!
//! Files are fed through an incremental hasher in fixed-size chunks, so neither
//! file is ever loaded into memory whole. Digests are never cached: every call
//! re-reads the file.

use crate::error::SyncError;
use crate::types::Digest;
use blake3::Hasher;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Default read chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Outcome of comparing two files by content
#[derive(Debug)]
pub enum ComparisonResult {
    Identical,
    Different,
    /// One of the two files could not be read; the error names which.
    Unreadable(SyncError),
}

impl ComparisonResult {
    pub fn is_identical(&self) -> bool {
        matches!(self, ComparisonResult::Identical)
    }

    /// Anything short of a confirmed match forces a re-copy.
    pub fn needs_copy(&self) -> bool {
        !self.is_identical()
    }
}

/// Compares files by digest
#[derive(Debug, Clone)]
pub struct ContentComparator {
    chunk_size: usize,
}

impl Default for ContentComparator {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ContentComparator {
    /// Create a comparator reading `chunk_size` bytes at a time (0 falls back to the default)
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute the digest of a file's content
    ///
    /// Any open or read failure yields `SyncError::Read` tagged with `path`;
    /// a partial digest is never returned.
    pub fn digest(&self, path: &Path) -> Result<Digest, SyncError> {
        let mut file = File::open(path).map_err(|e| SyncError::read(path, e))?;
        let mut hasher = Hasher::new();
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SyncError::read(path, e)),
            };
            hasher.update(&buf[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Decide whether two files hold byte-identical content
    pub fn contents_equal(&self, a: &Path, b: &Path) -> ComparisonResult {
        let digest_a = match self.digest(a) {
            Ok(d) => d,
            Err(e) => return ComparisonResult::Unreadable(e),
        };
        let digest_b = match self.digest(b) {
            Ok(d) => d,
            Err(e) => return ComparisonResult::Unreadable(e),
        };

        if digest_a == digest_b {
            ComparisonResult::Identical
        } else {
            tracing::debug!(
                a = %a.display(),
                b = %b.display(),
                digest_a = %digest_hex(&digest_a),
                digest_b = %digest_hex(&digest_b),
                "Content digests differ"
            );
            ComparisonResult::Different
        }
    }
}

/// Lowercase hex rendering of a digest
pub fn digest_hex(digest: &Digest) -> String {
    hex::encode(digest)
}
