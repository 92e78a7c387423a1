//! Spool files: ephemeral intermediates between pipeline stages
//!
//! A spool file holds one JSON record per line. Each is produced by one
//! stage and consumed by exactly one downstream stage. The `SpoolManager`
//! tracks every file it hands out and removes whatever is still live when
//! the pipeline finishes; its Drop impl is the backstop for early returns,
//! so no intermediate file outlives a query.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::observability::Logger;
use crate::storage::Record;

use super::errors::{ExecError, ExecResult};

/// Creates, tracks, and removes spool files for one query
pub struct SpoolManager {
    dir: PathBuf,
    live: Vec<PathBuf>,
}

impl SpoolManager {
    /// Prepares the spool directory.
    pub fn new(dir: &Path) -> ExecResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            ExecError::spool_io(format!("failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            live: Vec::new(),
        })
    }

    /// Opens a fresh, uniquely named spool file for writing.
    pub fn create(&mut self) -> ExecResult<SpoolWriter> {
        let path = self.dir.join(format!("spool_{}.jsonl", Uuid::new_v4()));
        let writer = SpoolWriter::create(&path)?;
        self.live.push(path);
        Ok(writer)
    }

    /// Removes one consumed spool file.
    pub fn release(&mut self, path: &Path) -> ExecResult<()> {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(ExecError::spool_io(format!(
                    "failed to remove {}: {}",
                    path.display(),
                    e
                )));
            }
        }
        self.live.retain(|p| p != path);
        Ok(())
    }

    /// Removes every spool file still tracked. Called on success and on
    /// every failure path; removal errors are logged, not raised, so
    /// cleanup always runs to completion.
    pub fn cleanup(&mut self) {
        if self.live.is_empty() {
            return;
        }
        Logger::trace(
            "SPOOL_CLEANUP",
            &[("files", &self.live.len().to_string())],
        );
        for path in self.live.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    Logger::warn(
                        "SPOOL_REMOVE_FAILED",
                        &[
                            ("path", &path.display().to_string()),
                            ("reason", &e.to_string()),
                        ],
                    );
                }
            }
        }
    }

    /// Number of files currently tracked
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl Drop for SpoolManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Writes records to a spool file, one JSON object per line
pub struct SpoolWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl SpoolWriter {
    fn create(path: &Path) -> ExecResult<Self> {
        let file = File::create(path).map_err(|e| {
            ExecError::spool_io(format!("failed to create {}: {}", path.display(), e))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        })
    }

    /// Appends one record.
    pub fn write(&mut self, record: &Record) -> ExecResult<()> {
        serde_json::to_writer(&mut self.out, record).map_err(|e| {
            ExecError::spool_io(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        self.out.write_all(b"\n").map_err(|e| {
            ExecError::spool_io(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Flushes and returns the finished file's path.
    pub fn finish(mut self) -> ExecResult<PathBuf> {
        self.out.flush().map_err(|e| {
            ExecError::spool_io(format!("failed to flush {}: {}", self.path.display(), e))
        })?;
        Ok(self.path)
    }
}

/// Streams records back out of a spool file
pub struct SpoolReader {
    path: PathBuf,
    lines: std::io::Lines<BufReader<File>>,
}

impl SpoolReader {
    /// Opens a spool file for reading.
    pub fn open(path: &Path) -> ExecResult<Self> {
        let file = File::open(path).map_err(|e| {
            ExecError::spool_io(format!("failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
        })
    }

    /// Reads the next record, or None at end of file.
    pub fn next_record(&mut self) -> ExecResult<Option<Record>> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line.map_err(|e| {
                    ExecError::spool_io(format!("failed to read {}: {}", self.path.display(), e))
                })?,
                None => return Ok(None),
            };
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line).map_err(|e| {
                ExecError::spool_io(format!("bad spool line in {}: {}", self.path.display(), e))
            })?;
            return Ok(Some(record));
        }
    }

    /// Reads every remaining record.
    pub fn read_all(&mut self) -> ExecResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }
}
