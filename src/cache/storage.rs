use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{CacheEntry, CacheError};

/// CSV file with a `log_hash,error_line,gpt_answer` header. Rows are only ever appended.
#[derive(Debug)]
pub struct CacheStorage {
    storage_path: PathBuf,
}

impl CacheStorage {
    /// Creates the file with just a header row if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let storage_path = path.into();
        if !storage_path.exists() {
            if let Some(parent) = storage_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut writer = csv::Writer::from_path(&storage_path)?;
            writer.write_record(["log_hash", "error_line", "gpt_answer"])?;
            writer.flush()?;
        }
        Ok(Self { storage_path })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Rows that fail to parse, such as a half-written append, are skipped.
    pub fn read_all(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.storage_path)?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<CacheEntry>() {
            match row {
                Ok(entry) => entries.push(entry),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(path = ?self.storage_path, skipped, "skipped unreadable cache rows");
        }

        Ok(entries)
    }

    pub fn append(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.storage_path)?;
        // A crash mid-append can leave the last row without its newline.
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool, CacheError> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
