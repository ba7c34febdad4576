//! Atomic file persistence: write-to-temp + rename, shared by the dictionary
//! text and binary writers.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::CoreError;

/// Writes `contents` to `path` by first writing to a temp file in the same
/// directory, then renaming over the destination. Guarantees a reader never
/// observes a partially-written file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir).map_err(|e| CoreError::io(path, e))?;

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| CoreError::io(path, e))?;
    {
        let mut writer = BufWriter::new(&mut temp_file);
        writer.write_all(contents).map_err(|e| CoreError::io(path, e))?;
        writer.flush().map_err(|e| CoreError::io(path, e))?;
    }
    temp_file.persist(path).map_err(|e| CoreError::io(path, e.error))?;
    Ok(())
}

pub fn read_to_string(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path).map_err(|e| CoreError::io(path, e))
}

pub fn open_buffered(path: &Path) -> Result<BufReader<File>, CoreError> {
    File::open(path).map(BufReader::new).map_err(|e| CoreError::io(path, e))
}
