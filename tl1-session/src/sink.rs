//! Destinations for collected autonomous messages
//!
//! The collector writes one JSON document per line.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Append-only line writer
pub trait CollectorSink: Send + Sync {
    fn append(&self, line: &str) -> io::Result<()>;
}

/// Appends lines to a file
#[derive(Debug)]
pub struct JsonLinesCollector {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesCollector {
    /// Open `path` for appending, creating it when missing
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CollectorSink for JsonLinesCollector {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

/// Keeps lines in memory; clones share the same list
#[derive(Debug, Clone, Default)]
pub struct MemoryCollector {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl CollectorSink for MemoryCollector {
    fn append(&self, line: &str) -> io::Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}
