//! Assembler: concatenates part files into the final artifact.
//!
//! Runs only after every worker has terminated. Parts are validated as an
//! exact tiling of `[0, size-1]` before a single byte is written, then
//! streamed in offset order with a fixed-size buffer and removed one by one.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::AssemblyError;
use crate::part_store::{PartFile, PartStore};
use crate::range::ByteRange;

/// Read buffer used while streaming parts.
pub const ASSEMBLY_BUFFER: usize = 1024 * 1024;

/// Checks that `parts` (sorted by start) cover `[0, size-1]` exactly once.
/// Empty parts are ignored.
pub fn check_parts(parts: &[PartFile], size: u64) -> Result<(), AssemblyError> {
    let mut next = 0u64;
    let mut prev: Option<ByteRange> = None;
    for part in parts.iter().filter(|p| p.len > 0) {
        let range = part.range();
        if range.start > next {
            return Err(AssemblyError::Missing(ByteRange::new(next, range.start - 1)));
        }
        if range.start < next {
            let first = prev.unwrap_or(ByteRange::new(0, next - 1));
            return Err(AssemblyError::Overlap { first, second: range });
        }
        next = range.end + 1;
        prev = Some(range);
    }
    if next < size {
        return Err(AssemblyError::Missing(ByteRange::new(next, size - 1)));
    }
    if next > size {
        return Err(AssemblyError::SizeMismatch {
            expected: size,
            actual: next,
        });
    }
    Ok(())
}

fn staging_path(output: &Path) -> PathBuf {
    let mut o = output.as_os_str().to_owned();
    o.push(".assembling");
    PathBuf::from(o)
}

/// Joins every part in `store` into `output` and deletes the parts.
///
/// Writes to a staging file next to `output` and renames it into place once
/// all parts are consumed. Returns the number of bytes written.
pub fn assemble(store: &PartStore, output: &Path, size: u64) -> Result<u64, AssemblyError> {
    let parts = store.list()?;
    check_parts(&parts, size)?;
    tracing::info!(parts = parts.len(), size, output = %output.display(), "assembling");

    let staging = staging_path(output);
    let mut out = File::create(&staging)?;
    let mut buf = vec![0u8; ASSEMBLY_BUFFER];
    let mut written = 0u64;

    for part in &parts {
        let mut input = File::open(&part.path)?;
        let mut copied = 0u64;
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            copied += n as u64;
        }
        drop(input);
        if copied != part.len {
            return Err(AssemblyError::SizeMismatch {
                expected: part.len,
                actual: copied,
            });
        }
        written += copied;
        fs::remove_file(&part.path)?;
        tracing::trace!(run_start = part.run_start, bytes = copied, "part consumed");
    }

    out.sync_all()?;
    drop(out);
    if written != size {
        return Err(AssemblyError::SizeMismatch {
            expected: size,
            actual: written,
        });
    }
    fs::rename(&staging, output)?;
    tracing::info!(bytes = written, "assembled {}", output.display());
    Ok(written)
}
