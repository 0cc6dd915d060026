use rackprobe_core::{now_stamp, LogLevel};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Leveled logger writing every line to stdout and appending it to a
/// configured file. The file path is an explicit constructor argument so
/// each component (and each test) can point at its own destination.
#[derive(Debug, Clone)]
pub struct Logger {
    path: PathBuf,
}

impl Logger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` and emits it on both
    /// channels. The file append is best-effort: a full disk or unwritable
    /// path must not take down a sampler tick, so failures there are
    /// reported on stderr and otherwise ignored.
    pub fn log(&self, level: LogLevel, message: &str) {
        let line = format!("[{}] [{}] {}", now_stamp(), level, message);
        println!("{}", line);
        if let Err(err) = self.append(&line) {
            eprintln!("rackprobe: log append to {} failed: {}", self.path.display(), err);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)
    }
}
