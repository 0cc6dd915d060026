use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only per-metric CSV file. The header is written exactly once, at
/// creation, before any data row can exist; each appended row is one fully
/// formed line.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Truncates any previous run's file and writes the header.
    pub fn create(path: impl Into<PathBuf>, header: &str) -> Result<Self> {
        let path = path.into();
        std::fs::write(&path, format!("{}\n", header))
            .with_context(|| format!("create {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn append(&self, row: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        writeln!(file, "{}", row).with_context(|| format!("append to {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
