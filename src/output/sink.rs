//! Persistence of history entries
//!
//! The persistence worker copies the newest history entry out under the
//! history lock and hands it to a [`PersistenceSink`] afterwards, so file I/O
//! never happens while the lock is held.
//!
//! [`FileSink`] writes one `"<value>,<timestamp>\n"` line per entry.

use crate::error::SinkError;
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How the output file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Start from an empty file
    #[default]
    Truncate,
    /// Keep existing content and add to the end
    Append,
}

/// Destination for persisted entries
pub trait PersistenceSink: Send {
    /// Persist one entry
    fn write_entry(&mut self, entry: &HistoryEntry) -> Result<(), SinkError>;
}

/// Format an entry as a persisted line (including the newline)
pub fn format_entry(entry: &HistoryEntry) -> String {
    format!("{},{}\n", entry.value, entry.timestamp)
}

/// Line-per-entry file writer
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open `path` in the given mode
    ///
    /// # Errors
    ///
    /// [`SinkError::InvalidDestination`] for an empty or non-UTF-8 path,
    /// [`SinkError::Io`] when the file cannot be opened.
    pub fn open(path: &Path, mode: WriteMode) -> Result<Self, SinkError> {
        let display = match path.to_str() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return Err(SinkError::InvalidDestination(path.to_path_buf())),
        };

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Truncate => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };

        let file = options.open(path).map_err(|source| SinkError::Io {
            path: display,
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for FileSink {
    fn write_entry(&mut self, entry: &HistoryEntry) -> Result<(), SinkError> {
        self.file
            .write_all(format_entry(entry).as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| SinkError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(value: i64, timestamp: f64) -> HistoryEntry {
        HistoryEntry { value, timestamp }
    }

    #[test]
    fn test_format_entry() {
        assert_eq!(format_entry(&entry(3, 1700000000.25)), "3,1700000000.25\n");
    }

    #[test]
    fn test_truncate_then_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.txt");
        fs::write(&path, "stale\n").unwrap();

        let mut sink = FileSink::open(&path, WriteMode::Truncate).unwrap();
        sink.write_entry(&entry(1, 1.5)).unwrap();
        sink.write_entry(&entry(2, 2.5)).unwrap();
        drop(sink);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,1.5\n2,2.5\n");

        let mut sink = FileSink::open(&path, WriteMode::Append).unwrap();
        sink.write_entry(&entry(5, 3.0)).unwrap();
        assert_eq!(sink.path(), path.as_path());
        drop(sink);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,1.5\n2,2.5\n5,3\n");
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let err = FileSink::open(Path::new(""), WriteMode::Truncate).unwrap_err();
        assert!(matches!(err, SinkError::InvalidDestination(_)));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("output.txt");
        let err = FileSink::open(&path, WriteMode::Append).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn test_write_mode_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            mode: WriteMode,
        }
        let doc: Doc = ::toml::from_str("mode = \"append\"").unwrap();
        assert_eq!(doc.mode, WriteMode::Append);
    }
}
