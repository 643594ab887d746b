//! Part Store: append-only files, one per contiguous run a worker downloads.
//!
//! A run is named by its first byte offset (`<start>.part`) and lives in the
//! working directory next to the final artifact. Each part has exactly one
//! writer at a time, so no locking is needed.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::range::ByteRange;

/// Part file suffix.
pub const PART_SUFFIX: &str = ".part";

/// File name for the run starting at `run_start`.
pub fn part_file_name(run_start: u64) -> String {
    format!("{}{}", run_start, PART_SUFFIX)
}

/// Parses `<digits>.part` back to its start offset. Leading zeros are
/// rejected so each offset has exactly one spelling.
pub fn parse_part_file_name(name: &str) -> Option<u64> {
    let digits = name.strip_suffix(PART_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// A part file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFile {
    pub run_start: u64,
    pub len: u64,
    pub path: PathBuf,
}

impl PartFile {
    /// Byte range this part covers; empty when the file is empty.
    pub fn range(&self) -> ByteRange {
        if self.len == 0 {
            // end < start marks the range empty.
            ByteRange {
                start: self.run_start,
                end: self.run_start.wrapping_sub(1),
            }
        } else {
            ByteRange::new(self.run_start, self.run_start + self.len - 1)
        }
    }
}

/// Directory holding the parts of one download.
#[derive(Debug, Clone)]
pub struct PartStore {
    dir: PathBuf,
}

impl PartStore {
    /// Uses `dir` as the working directory, creating it if needed.
    pub fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn part_path(&self, run_start: u64) -> PathBuf {
        self.dir.join(part_file_name(run_start))
    }

    /// Opens a new part for the run starting at `run_start`. Fails if the
    /// part already exists: two runs with the same start would overlap.
    pub fn start_run(&self, run_start: u64) -> io::Result<PartWriter> {
        let path = self.part_path(run_start);
        let file = File::options().write(true).create_new(true).open(&path)?;
        Ok(PartWriter {
            file,
            path,
            run_start,
            len: 0,
        })
    }

    /// Every part in the directory, sorted by numeric start offset.
    pub fn list(&self) -> io::Result<Vec<PartFile>> {
        let mut parts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(run_start) = name.to_str().and_then(parse_part_file_name) else {
                continue;
            };
            parts.push(PartFile {
                run_start,
                len: entry.metadata()?.len(),
                path: entry.path(),
            });
        }
        parts.sort_by_key(|p| p.run_start);
        Ok(parts)
    }
}

/// Append handle for one run.
#[derive(Debug)]
pub struct PartWriter {
    file: File,
    path: PathBuf,
    run_start: u64,
    len: u64,
}

impl PartWriter {
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.len += data.len() as u64;
        Ok(())
    }

    pub fn run_start(&self) -> u64 {
        self.run_start
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset the next appended byte belongs to.
    pub fn next_offset(&self) -> u64 {
        self.run_start + self.len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
