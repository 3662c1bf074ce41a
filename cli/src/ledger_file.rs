//! File-backed persistence for one ledger document.
//!
//! The file on disk is the durable store, so it carries the append
//! obligations itself:
//!
//! - `lock()` takes an exclusive lock on a sidecar `<ledger>.lock` file. An
//!   append holds it across read, link and commit, so appends to one file are
//!   serialized across processes.
//! - `commit()` re-reads the file and refuses to write unless its tail is
//!   still the hash the new event was linked to (`ChainConflict`).
//! - Every write goes to a temporary file in the same directory that is then
//!   renamed over the ledger, so a crash never leaves a truncated document.
//!
//! Readers need no lock: they always see either the old or the new file.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use bmo_contracts::{
    document::LedgerDocument,
    error::{BmoError, BmoResult},
};

/// Exclusive lock on a ledger file, released on drop.
pub struct LedgerLock {
    file: File,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// A ledger document stored as pretty-printed JSON at `path`.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until this process holds the ledger's exclusive lock.
    pub fn lock(&self) -> BmoResult<LedgerLock> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| store_failed(&lock_path, "open lock file", e))?;
        file.lock_exclusive()
            .map_err(|e| store_failed(&lock_path, "lock", e))?;

        debug!(path = %self.path.display(), "ledger lock acquired");
        Ok(LedgerLock { file })
    }

    pub fn read(&self) -> BmoResult<LedgerDocument> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| store_failed(&self.path, "read", e))?;
        serde_json::from_str(&text).map_err(|e| BmoError::StoreFailed {
            reason: format!("ledger '{}' is not a valid ledger document: {}", self.path.display(), e),
        })
    }

    /// Write a brand-new ledger. Fails if the path already exists.
    pub fn create(&self, document: &LedgerDocument) -> BmoResult<()> {
        let tmp = self.write_temp(document)?;
        tmp.persist_noclobber(&self.path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                BmoError::StoreFailed {
                    reason: format!("ledger '{}' already exists", self.path.display()),
                }
            } else {
                store_failed(&self.path, "create", e.error)
            }
        })?;

        debug!(path = %self.path.display(), "ledger created");
        Ok(())
    }

    /// Replace the ledger with `document`, provided the file's tail is still
    /// `expected_tail`.
    ///
    /// The caller must hold `lock` from before it read the document it
    /// extended.
    pub fn commit(&self, _lock: &LedgerLock, expected_tail: &str, document: &LedgerDocument) -> BmoResult<()> {
        let current = self.read()?;
        if current.decision.id != document.decision.id {
            return Err(BmoError::StoreFailed {
                reason: format!(
                    "ledger '{}' now holds decision '{}', not '{}'",
                    self.path.display(),
                    current.decision.id,
                    document.decision.id
                ),
            });
        }
        if current.tail_hash() != expected_tail {
            warn!(
                path = %self.path.display(),
                expected = %expected_tail,
                actual = %current.tail_hash(),
                "ledger commit rejected: tail moved"
            );
            return Err(BmoError::ChainConflict {
                decision_id: document.decision.id.to_string(),
                expected: expected_tail.to_string(),
                actual: current.tail_hash().to_string(),
            });
        }

        let tmp = self.write_temp(document)?;
        tmp.persist(&self.path)
            .map_err(|e| store_failed(&self.path, "replace", e.error))?;

        debug!(
            path = %self.path.display(),
            event_count = document.events.len(),
            "ledger committed"
        );
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("ledger"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Fully write and sync `document` to a temporary file next to the ledger.
    fn write_temp(&self, document: &LedgerDocument) -> BmoResult<NamedTempFile> {
        let text = serde_json::to_string_pretty(document).map_err(|e| BmoError::Serialization {
            reason: format!("failed to encode ledger document: {e}"),
        })?;

        let dir = self.directory();
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| store_failed(dir, "create temp file in", e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| store_failed(tmp.path(), "write", e))?;
        Ok(tmp)
    }
}

fn store_failed(path: &Path, op: &str, e: std::io::Error) -> BmoError {
    BmoError::StoreFailed {
        reason: format!("failed to {} '{}': {}", op, path.display(), e),
    }
}
