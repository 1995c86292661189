//! Incremental log reading.
//!
//! The cursor is a byte offset into the monitored file. Each read consumes
//! `[cursor, size)` and moves the cursor to `size`; a file smaller than the
//! cursor is treated as rotated and read from the start.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;

/// Result of one incremental read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The file does not exist; the cursor is untouched.
    Missing,
    /// Size equals the cursor; nothing was read.
    Unchanged,
    /// Newly appended text, decoded lossily.
    NewData {
        text: String,
        bytes: u64,
        rotated: bool,
    },
}

/// Process-resident read offset.
#[derive(Debug, Default)]
pub struct ScanCursor {
    offset: Mutex<u64>,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        *self.offset.lock()
    }

    pub fn set(&self, position: u64) {
        *self.offset.lock() = position;
    }

    /// Move the cursor to the end of `path` without reading.
    ///
    /// Returns the new position, or `None` when the file is missing.
    pub fn seek_to_end(&self, path: &Path) -> std::io::Result<Option<u64>> {
        if !path.exists() {
            return Ok(None);
        }
        let size = std::fs::metadata(path)?.len();
        self.set(size);
        Ok(Some(size))
    }

    /// Read everything appended since the last call.
    pub fn read_new(&self, path: &Path) -> std::io::Result<ReadOutcome> {
        if !path.exists() {
            return Ok(ReadOutcome::Missing);
        }

        let mut offset = self.offset.lock();
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();

        let rotated = size < *offset;
        if rotated {
            *offset = 0;
        }

        if size == *offset {
            return Ok(ReadOutcome::Unchanged);
        }

        file.seek(SeekFrom::Start(*offset))?;
        let wanted = size - *offset;
        let mut raw = Vec::with_capacity(wanted as usize);
        file.take(wanted).read_to_end(&mut raw)?;

        *offset = size;

        Ok(ReadOutcome::NewData {
            text: String::from_utf8_lossy(&raw).into_owned(),
            bytes: raw.len() as u64,
            rotated,
        })
    }
}
