//! Append-only JSONL journal
//!
//! Every space creation and every appended event is written as one JSON
//! line to `events.jsonl` and synced before the store makes it visible.
//! On start the journal is replayed to rebuild the space registry.
//!
//! A failed append is rolled back to the previous end of the file so the
//! next record never lands after a torn line. When the rollback itself
//! fails the journal refuses further appends.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::error::EventStoreResult;
use crate::types::{Event, SpaceId};

/// One line of the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalRecord {
    SpaceCreated { space_id: SpaceId, created_at: i64 },
    EventAppended { space_id: SpaceId, event: Event },
}

impl JournalRecord {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// Sink the journal appends to
///
/// Implemented for [`File`]; other sinks let tests inject write failures.
pub trait JournalWriter: Write + Send + Sync + fmt::Debug {
    /// Current end of the written data
    fn end_offset(&self) -> io::Result<u64>;

    /// Cut everything after `offset`
    fn truncate(&mut self, offset: u64) -> io::Result<()>;

    /// Make written data durable
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalWriter for File {
    fn end_offset(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, offset: u64) -> io::Result<()> {
        self.set_len(offset)?;
        self.sync_data()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Durable append-only log backing the EventStore
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    writer: Box<dyn JournalWriter>,
    poisoned: bool,
}

impl Journal {
    /// Journal file name inside the data directory
    pub const FILE_NAME: &'static str = "events.jsonl";

    /// Open (or create) the journal inside `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P) -> EventStoreResult<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let path = data_dir.as_ref().join(Self::FILE_NAME);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self::with_writer(path, Box::new(file)))
    }

    /// Journal that appends through `writer` and loads from `path`
    pub fn with_writer(path: PathBuf, writer: Box<dyn JournalWriter>) -> Self {
        Self {
            path,
            writer,
            poisoned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an unrecoverable write failure disabled appends
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Append one record and sync it to disk
    ///
    /// On failure the file is cut back to where the record started. If that
    /// also fails the journal is poisoned and every later append errors.
    pub fn append(&mut self, record: &JournalRecord) -> EventStoreResult<()> {
        if self.poisoned {
            return Err(io::Error::other("journal disabled after an unrecoverable write failure").into());
        }

        let mut line = record.to_json_line()?;
        line.push('\n');

        let start = self.writer.end_offset()?;
        if let Err(e) = self.write_line(line.as_bytes()) {
            match self.writer.truncate(start) {
                Ok(()) => {
                    warn!(path = %self.path.display(), error = %e, "journal append failed, rolled back");
                }
                Err(rollback) => {
                    self.poisoned = true;
                    error!(
                        path = %self.path.display(),
                        error = %e,
                        rollback_error = %rollback,
                        "journal append failed and could not be rolled back, disabling journal"
                    );
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.flush()?;
        self.writer.sync()
    }

    /// Load every readable record, skipping corrupted lines
    pub fn load(&self) -> EventStoreResult<Vec<JournalRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match JournalRecord::from_json_line(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_num + 1,
                        error = %e,
                        "skipping unreadable journal record"
                    );
                }
            }
        }

        Ok(records)
    }
}
